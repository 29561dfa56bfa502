//! MIPS32 assembly generator targeting the SPIM simulator.
//!
//! Walks the already-type-checked parse tree function by function, the
//! same way [`mipsc_sem`] walks it to build the scope tree, and emits a
//! single `.data`/`.text` text stream. Register allocation is the flat
//! round-robin counter in [`registers`]; there is no liveness analysis, so
//! a live left operand is spilled to the stack around every non-leaf right
//! operand (see [`Generator::emit_binary`]).

pub mod error;
pub mod registers;

pub use error::{CodeGenError, Result};

use mipsc_par::{NodeId, ParseTree};
use mipsc_sem::{RibId, ScopeTree, SymbolRecord, Type};
use mipsc_util::StringTable;
use registers::RegisterAllocator;
use std::collections::HashMap;
use std::fmt::Write as _;

const NEWLINE_LABEL: &str = "newline";

enum DataItem {
    Asciiz(String),
    /// A fixed-size, zeroed buffer for a `read(text)` call site.
    Buffer(usize),
}

struct Generator<'a> {
    tree: &'a ParseTree,
    scopes: &'a ScopeTree,
    strings: &'a StringTable,
    data: Vec<(String, DataItem)>,
    text: String,
    label_counter: u32,
    regs: RegisterAllocator,
    locals: HashMap<String, (i32, Type)>,
    /// Incoming parameters, at fixed positive `$fp`-relative offsets set up
    /// once per function by the caller's argument pushes (see
    /// [`Generator::emit_call`]) — unlike `locals`, never lazily assigned.
    params: HashMap<String, (i32, Type)>,
    next_offset: i32,
    is_main: bool,
}

/// Generates the full assembly text for `tree`. The tree and `scopes` must
/// already have passed type checking — this function assumes a
/// semantically valid program and only fails on an internal inconsistency
/// (see [`CodeGenError`]).
pub fn generate(tree: &ParseTree, scopes: &ScopeTree, strings: &StringTable) -> Result<String> {
    let mut gen = Generator {
        tree,
        scopes,
        strings,
        data: vec![(NEWLINE_LABEL.to_string(), DataItem::Asciiz("\\n".to_string()))],
        text: String::new(),
        label_counter: 0,
        regs: RegisterAllocator::new(),
        locals: HashMap::new(),
        params: HashMap::new(),
        next_offset: 0,
        is_main: false,
    };
    gen.generate_program()?;
    Ok(gen.render())
}

impl<'a> Generator<'a> {
    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(".data\n");
        for (label, item) in &self.data {
            match item {
                DataItem::Asciiz(s) => {
                    let _ = writeln!(out, "{label}: .asciiz \"{s}\"");
                }
                DataItem::Buffer(size) => {
                    let _ = writeln!(out, "{label}: .space {size}");
                }
            }
        }
        out.push_str("\n.text\n.globl main\n");
        out.push_str(&self.text);
        out
    }

    fn new_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{prefix}_{}", self.label_counter)
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        self.text.push_str("    ");
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn emit_label(&mut self, label: &str) {
        let _ = writeln!(self.text, "{label}:");
    }

    fn generate_program(&mut self) -> Result<()> {
        let root = self.tree.root().ok_or(CodeGenError::EmptyTree)?;
        let mut functions = Vec::new();
        find_all(self.tree, root, "funcion", &mut functions);
        for func_node in functions {
            self.generate_function(func_node)?;
        }
        Ok(())
    }

    fn generate_function(&mut self, func_node: NodeId) -> Result<()> {
        self.locals.clear();
        self.params.clear();
        self.next_offset = 0;

        let is_main = find_first(self.tree, func_node, "restomain").is_some();
        self.is_main = is_main;
        let name = if is_main {
            "main".to_string()
        } else {
            first_terminal_lexeme(self.tree, func_node, "id").unwrap_or_default()
        };

        let name_sym = self.strings.get(&name).ok_or_else(|| CodeGenError::UnknownFunction(name.clone()))?;
        let rib = self
            .scopes
            .rib_for_function(name_sym)
            .ok_or_else(|| CodeGenError::UnknownFunction(name.clone()))?;
        let (parameters, return_type) = match self.scopes.ribs[self.scopes.global].bindings.get(&name_sym) {
            Some(SymbolRecord::Function { parameters, return_type }) => (parameters.clone(), *return_type),
            _ => (Vec::new(), Type::Void),
        };

        // The caller pushes arguments in declared order (see `emit_call`), so
        // after the first argument's push the stack holds them oldest-first
        // at the bottom; the callee's own `$ra`/`$fp` save sits below all of
        // them, making the *first* parameter the furthest from `$fp`.
        let param_count = parameters.len();
        for (i, (psym, ty)) in parameters.iter().enumerate() {
            let offset = 8 + 4 * (param_count - 1 - i) as i32;
            let pname = self.strings.resolve(*psym).to_string();
            self.params.insert(pname, (offset, *ty));
        }

        self.emit_label(&name);
        if !is_main {
            self.emit("addiu $sp, $sp, -8");
            self.emit("sw $ra, 4($sp)");
            self.emit("sw $fp, 0($sp)");
            self.emit("move $fp, $sp");
        }

        let body_start = self.text.len();
        let mut body = Vec::new();
        find_all(self.tree, func_node, "masinstrucciones", &mut body);
        for block in body {
            self.generate_block(block, rib)?;
        }

        if self.next_offset > 0 {
            let reserve = format!("    addiu $sp, $sp, -{}\n", self.next_offset);
            self.text.insert_str(body_start, &reserve);
        }

        if is_main {
            self.emit("li $v0, 10");
            self.emit("syscall");
        } else if return_type == Type::Void {
            self.emit_epilogue();
        }

        Ok(())
    }

    fn emit_epilogue(&mut self) {
        self.emit("move $sp, $fp");
        self.emit("lw $fp, 0($sp)");
        self.emit("lw $ra, 4($sp)");
        self.emit("addiu $sp, $sp, 8");
        self.emit("jr $ra");
    }

    fn generate_block(&mut self, block: NodeId, rib: RibId) -> Result<()> {
        let mut statements = Vec::new();
        find_direct(self.tree, block, "instruccion", &mut statements);
        for stmt in statements {
            self.generate_statement(stmt, rib)?;
        }
        Ok(())
    }

    fn generate_statement(&mut self, stmt: NodeId, rib: RibId) -> Result<()> {
        if let Some(node) = find_first(self.tree, stmt, "if_stmt") {
            return self.generate_if(node, rib);
        }
        if let Some(node) = find_first(self.tree, stmt, "while_stmt") {
            return self.generate_while(node, rib);
        }
        if let Some(node) = find_first(self.tree, stmt, "for_stmt") {
            return self.generate_for(node, rib);
        }
        if let Some(node) = find_first(self.tree, stmt, "show_stmt") {
            return self.generate_show(node, rib);
        }
        if let Some(node) = find_first(self.tree, stmt, "read_stmt") {
            return self.generate_read(node, rib);
        }
        if let Some(node) = find_first(self.tree, stmt, "return_stmt") {
            return self.generate_return(node, rib);
        }
        if find_first(self.tree, stmt, "asignaciones").is_some() {
            return self.generate_assignment(stmt, rib);
        }
        Ok(())
    }

    /// Returns the `$fp`-relative offset of `name`: a positive offset for an
    /// incoming parameter (already known from the function prologue), or a
    /// negative offset lazily assigned the first time a local is touched.
    fn offset_for(&mut self, name: &str, rib: RibId) -> Result<(i32, Type)> {
        if let Some(&(offset, ty)) = self.params.get(name) {
            return Ok((offset, ty));
        }
        if let Some(&(offset, ty)) = self.locals.get(name) {
            return Ok((offset, ty));
        }
        let sym = self.strings.get(name).ok_or_else(|| CodeGenError::UnknownVariable(name.to_string()))?;
        let ty = match self.scopes.resolve(rib, sym) {
            Some(SymbolRecord::Variable { ty }) | Some(SymbolRecord::Parameter { ty }) => *ty,
            _ => return Err(CodeGenError::UnknownVariable(name.to_string())),
        };
        self.next_offset += 4;
        let offset = -self.next_offset;
        self.locals.insert(name.to_string(), (offset, ty));
        Ok((offset, ty))
    }

    /// `asignaciones -> id ext`, `ext -> tipodato opcionesasig | extension`,
    /// `extension -> "=" expresion | "(" parametros ")"`,
    /// `opcionesasig -> "=" expresion | ''`. Covers a fresh declaration (with
    /// or without an initializer), a plain reassignment, and a bare call
    /// used as a statement (its result is discarded).
    fn generate_assignment(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let assign = find_first(self.tree, node, "asignaciones").ok_or(CodeGenError::EmptyTree)?;
        let Some(name) = first_terminal_lexeme(self.tree, assign, "id") else { return Ok(()) };
        let Some(ext) = find_first(self.tree, assign, "ext") else { return Ok(()) };

        if let Some(extension) = find_direct_child(self.tree, ext, "extension") {
            let ext_children = self.tree.get(extension).children.clone();
            let Some(&first) = ext_children.first() else { return Ok(()) };
            match self.tree.get(first).symbol.as_str() {
                "=" => {
                    if let Some(&expr) = ext_children.get(1) {
                        let (offset, _ty) = self.offset_for(&name, rib)?;
                        let reg = self.emit_expr(expr, rib)?;
                        self.emit(format!("sw {reg}, {offset}($fp)"));
                    }
                }
                "(" => {
                    let args = ext_children.get(1).copied();
                    self.emit_call(&name, args, rib)?;
                }
                _ => {}
            }
            return Ok(());
        }

        let (offset, _ty) = self.offset_for(&name, rib)?;
        if let Some(opcionesasig) = find_direct_child(self.tree, ext, "opcionesasig") {
            let opt_children = &self.tree.get(opcionesasig).children;
            if opt_children.len() > 1 {
                let expr = opt_children[1];
                let reg = self.emit_expr(expr, rib)?;
                self.emit(format!("sw {reg}, {offset}($fp)"));
            }
        }
        Ok(())
    }

    fn generate_if(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let guard = first_expr_child(self.tree, node).ok_or(CodeGenError::EmptyTree)?;
        let reg = self.emit_expr(guard, rib)?;
        let else_label = self.new_label("else");
        let end_label = self.new_label("endif");

        self.emit(format!("beq {reg}, $zero, {else_label}"));
        let mut blocks = Vec::new();
        find_direct(self.tree, node, "masinstrucciones", &mut blocks);
        if let Some(then_block) = blocks.first() {
            self.generate_block(*then_block, rib)?;
        }
        self.emit(format!("j {end_label}"));
        self.emit_label(&else_label);
        if let Some(else_block) = blocks.get(1) {
            self.generate_block(*else_block, rib)?;
        }
        self.emit_label(&end_label);
        Ok(())
    }

    fn generate_while(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let start_label = self.new_label("while_start");
        let end_label = self.new_label("while_end");
        self.emit_label(&start_label);

        let guard = first_expr_child(self.tree, node).ok_or(CodeGenError::EmptyTree)?;
        let reg = self.emit_expr(guard, rib)?;
        self.emit(format!("beq {reg}, $zero, {end_label}"));

        let mut blocks = Vec::new();
        find_direct(self.tree, node, "masinstrucciones", &mut blocks);
        if let Some(body) = blocks.first() {
            self.generate_block(*body, rib)?;
        }
        self.emit(format!("j {start_label}"));
        self.emit_label(&end_label);
        Ok(())
    }

    /// `for_stmt -> for ( asignaciones ; expresion ; asignaciones ) {
    /// masinstrucciones }`, lowered at emission time into `init` followed by
    /// the same label/branch shape `generate_while` emits for `cond`, with
    /// `step` re-emitted at the end of every loop body iteration — i.e.
    /// `for (init; cond; step) { body }` becomes `init; while (cond) { body;
    /// step }`. The condition and body must be found as *direct* children
    /// (not via [`first_expr_child`]'s full walk), since `init`'s own
    /// initializer expression would otherwise be found first.
    fn generate_for(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let children = self.tree.get(node).children.clone();
        let mut assigns = children.iter().copied().filter(|&c| self.tree.get(c).symbol == "asignaciones");
        let init = assigns.next();
        let step = assigns.next();

        if let Some(init_node) = init {
            self.generate_assignment(init_node, rib)?;
        }

        let start_label = self.new_label("while_start");
        let end_label = self.new_label("while_end");
        self.emit_label(&start_label);

        let guard = find_direct_child(self.tree, node, "expresion").ok_or(CodeGenError::EmptyTree)?;
        let reg = self.emit_expr(guard, rib)?;
        self.emit(format!("beq {reg}, $zero, {end_label}"));

        if let Some(body) = find_direct_child(self.tree, node, "masinstrucciones") {
            self.generate_block(body, rib)?;
        }
        if let Some(step_node) = step {
            self.generate_assignment(step_node, rib)?;
        }
        self.emit(format!("j {start_label}"));
        self.emit_label(&end_label);
        Ok(())
    }

    fn generate_show(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let expr = first_expr_child(self.tree, node).ok_or(CodeGenError::EmptyTree)?;
        let ty = expr_type(self.tree, expr, rib, self.scopes, self.strings);
        let reg = self.emit_expr(expr, rib)?;
        self.emit(format!("move $a0, {reg}"));
        let syscall = if ty == Some(Type::Text) { 4 } else { 1 };
        self.emit(format!("li $v0, {syscall}"));
        self.emit("syscall");
        self.emit(format!("la $a0, {NEWLINE_LABEL}"));
        self.emit("li $v0, 4");
        self.emit("syscall");
        Ok(())
    }

    fn generate_read(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        let Some(name) = first_terminal_lexeme(self.tree, node, "id") else { return Ok(()) };
        let (offset, ty) = self.offset_for(&name, rib)?;
        match ty {
            Type::Int => {
                self.emit("li $v0, 5");
                self.emit("syscall");
                self.emit(format!("sw $v0, {offset}($fp)"));
            }
            Type::Float => {
                self.emit("li $v0, 6");
                self.emit("syscall");
                self.emit(format!("sw $v0, {offset}($fp)"));
            }
            Type::Text => {
                let buf_label = self.new_label("str");
                self.data.push((buf_label.clone(), DataItem::Buffer(64)));
                self.emit(format!("la $a0, {buf_label}"));
                self.emit("li $a1, 64");
                self.emit("li $v0, 8");
                self.emit("syscall");
                self.emit(format!("la $t0, {buf_label}"));
                self.emit(format!("sw $t0, {offset}($fp)"));
            }
            Type::Bool | Type::Void => {
                self.emit("li $v0, 5");
                self.emit("syscall");
                self.emit(format!("sw $v0, {offset}($fp)"));
            }
        }
        Ok(())
    }

    fn generate_return(&mut self, node: NodeId, rib: RibId) -> Result<()> {
        if let Some(expr) = first_expr_child(self.tree, node) {
            let reg = self.emit_expr(expr, rib)?;
            self.emit(format!("move $v0, {reg}"));
        }
        if self.is_main {
            self.emit("li $v0, 10");
            self.emit("syscall");
        } else {
            self.emit_epilogue();
        }
        Ok(())
    }

    /// `expresion -> ( expresion ) masexpresiones | id opciones masexpresiones
    /// | valordato masexpresiones`, `masexpresiones -> operacion expresion |
    /// ''`: lowers the left operand, then — only if `masexpresiones` is
    /// non-empty — recurses into its own `[operacion, expresion]` pair for
    /// the right-hand side. Returns the register holding the value.
    fn emit_expr(&mut self, node: NodeId, rib: RibId) -> Result<String> {
        let n = self.tree.get(node);
        let Some(&head) = n.children.first() else {
            let reg = self.regs.next();
            self.emit(format!("li {reg}, 0"));
            return Ok(reg);
        };
        let head_symbol = self.tree.get(head).symbol.clone();

        let left = match head_symbol.as_str() {
            "(" => match n.children.get(1).copied() {
                Some(inner) => self.emit_expr(inner, rib)?,
                None => {
                    let reg = self.regs.next();
                    self.emit(format!("li {reg}, 0"));
                    reg
                }
            },
            "id" => {
                let opciones = n.children.get(1).copied();
                self.emit_identifier_or_call(head, opciones, rib)?
            }
            "valordato" => self.emit_valordato(head),
            _ => {
                let reg = self.regs.next();
                self.emit(format!("li {reg}, 0"));
                reg
            }
        };

        let Some(&mx) = self.tree.get(node).children.last() else { return Ok(left) };
        let mx_children = self.tree.get(mx).children.clone();
        if mx_children.len() < 2 {
            return Ok(left);
        }
        let op = self.tree.get(mx_children[0]).symbol.clone();
        self.emit_binary(&op, left, mx_children[1], rib)
    }

    fn emit_valordato(&mut self, valordato: NodeId) -> String {
        let reg = self.regs.next();
        let Some(&term) = self.tree.get(valordato).children.first() else {
            self.emit(format!("li {reg}, 0"));
            return reg;
        };
        let t = self.tree.get(term);
        match t.symbol.as_str() {
            "intliteral" => {
                let v = t.lexeme.clone().unwrap_or_default();
                self.emit(format!("li {reg}, {v}"));
            }
            "floatliteral" => {
                let v: f64 = t.lexeme.as_deref().unwrap_or("0").parse().unwrap_or(0.0);
                self.emit(format!("li {reg}, {}", (v * 100.0) as i64));
            }
            "boolliteral" => {
                let v = if t.lexeme.as_deref() == Some("true") { 1 } else { 0 };
                self.emit(format!("li {reg}, {v}"));
            }
            "stringliteral" => {
                let label = self.new_label("str");
                let text = t.lexeme.clone().unwrap_or_default();
                self.data.push((label.clone(), DataItem::Asciiz(text)));
                self.emit(format!("la {reg}, {label}"));
            }
            _ => self.emit(format!("li {reg}, 0")),
        }
        reg
    }

    /// `id opciones`: a non-empty `opciones` (`( parametros )`) marks `id`
    /// as a call; otherwise it is a plain variable/parameter load.
    fn emit_identifier_or_call(&mut self, id_node: NodeId, opciones: Option<NodeId>, rib: RibId) -> Result<String> {
        let name = self.tree.get(id_node).lexeme.clone().unwrap_or_default();
        if is_call_suffix(self.tree, opciones) {
            let args = opciones.and_then(|o| find_direct_child(self.tree, o, "parametros"));
            return self.emit_call(&name, args, rib);
        }
        let (offset, _ty) = self.offset_for(&name, rib)?;
        let reg = self.regs.next();
        self.emit(format!("lw {reg}, {offset}($fp)"));
        Ok(reg)
    }

    /// Evaluates and pushes each argument in declared order, `jal`s the
    /// callee, then pops the arguments the caller just pushed and reads the
    /// result out of `$v0`.
    fn emit_call(&mut self, name: &str, args: Option<NodeId>, rib: RibId) -> Result<String> {
        let mut arg_exprs = Vec::new();
        if let Some(parametros) = args {
            collect_call_args(self.tree, parametros, &mut arg_exprs);
        }
        let count = arg_exprs.len();
        for expr in arg_exprs {
            let reg = self.emit_expr(expr, rib)?;
            self.emit("addiu $sp, $sp, -4");
            self.emit(format!("sw {reg}, 0($sp)"));
        }
        self.emit(format!("jal {name}"));
        if count > 0 {
            self.emit(format!("addiu $sp, $sp, {}", count * 4));
        }
        let dest = self.regs.next();
        self.emit(format!("move {dest}, $v0"));
        Ok(dest)
    }

    fn emit_binary(&mut self, op: &str, left: String, rhs: NodeId, rib: RibId) -> Result<String> {
        self.emit("addiu $sp, $sp, -4");
        self.emit(format!("sw {left}, 0($sp)"));
        let right = self.emit_expr(rhs, rib)?;
        let left_restored = self.regs.next();
        self.emit(format!("lw {left_restored}, 0($sp)"));
        self.emit("addiu $sp, $sp, 4");

        let dest = self.regs.next();
        match op {
            "+" => self.emit(format!("add {dest}, {left_restored}, {right}")),
            "-" => self.emit(format!("sub {dest}, {left_restored}, {right}")),
            "*" => self.emit(format!("mul {dest}, {left_restored}, {right}")),
            "/" => {
                self.emit(format!("div {left_restored}, {right}"));
                self.emit(format!("mflo {dest}"));
            }
            "%" => {
                self.emit(format!("div {left_restored}, {right}"));
                self.emit(format!("mfhi {dest}"));
            }
            "<" => self.emit(format!("slt {dest}, {left_restored}, {right}")),
            ">" => self.emit(format!("sgt {dest}, {left_restored}, {right}")),
            "==" => self.emit(format!("seq {dest}, {left_restored}, {right}")),
            "!=" => self.emit(format!("sne {dest}, {left_restored}, {right}")),
            "<=" => self.emit(format!("sle {dest}, {left_restored}, {right}")),
            ">=" => self.emit(format!("sge {dest}, {left_restored}, {right}")),
            "&&" => self.emit(format!("and {dest}, {left_restored}, {right}")),
            "||" => self.emit(format!("or {dest}, {left_restored}, {right}")),
            other => return Err(CodeGenError::UnmappedOperator(other.to_string())),
        }
        Ok(dest)
    }
}

/// The guard/return-value `expresion` always precedes any nested
/// `masinstrucciones` block in production order, so the first `expresion`
/// found in a pre-order walk is always the right one — this also looks
/// straight through a wrapper like `opcionretorno` without needing to know
/// about it.
fn first_expr_child(tree: &ParseTree, node: NodeId) -> Option<NodeId> {
    find_first(tree, node, "expresion")
}

/// `opciones -> ( parametros ) | ''`: a non-empty `opciones` (more than the
/// lone `e` leaf of its epsilon alternative) marks the preceding `id` as a
/// call.
fn is_call_suffix(tree: &ParseTree, opciones: Option<NodeId>) -> bool {
    match opciones {
        Some(node) => tree.get(node).children.len() > 1,
        None => false,
    }
}

/// `parametros -> expresion restoparametros | ''`, `restoparametros -> ","
/// expresion restoparametros | ''`: collects the argument expressions in
/// declared order.
fn collect_call_args(tree: &ParseTree, parametros: NodeId, out: &mut Vec<NodeId>) {
    let children = &tree.get(parametros).children;
    let Some(&first) = children.first() else { return };
    if tree.get(first).symbol != "expresion" {
        return;
    }
    out.push(first);
    if let Some(&resto) = children.get(1) {
        collect_resto_args(tree, resto, out);
    }
}

fn collect_resto_args(tree: &ParseTree, restoparametros: NodeId, out: &mut Vec<NodeId>) {
    let children = &tree.get(restoparametros).children;
    if children.len() < 2 {
        return;
    }
    out.push(children[1]);
    if let Some(&resto) = children.get(2) {
        collect_resto_args(tree, resto, out);
    }
}

/// Only one level deep from `node`'s own children — unlike [`find_first`],
/// does not recurse into grandchildren, since a production's alternatives
/// are mutually exclusive siblings and recursing could match a nested
/// occurrence of the same symbol inside a subexpression.
fn find_direct_child(tree: &ParseTree, node: NodeId, name: &str) -> Option<NodeId> {
    tree.get(node).children.iter().copied().find(|&c| tree.get(c).symbol == name)
}

fn find_first(tree: &ParseTree, node: NodeId, name: &str) -> Option<NodeId> {
    let n = tree.get(node);
    if n.symbol == name {
        return Some(node);
    }
    for &child in &n.children {
        if let Some(found) = find_first(tree, child, name) {
            return Some(found);
        }
    }
    None
}

fn find_all(tree: &ParseTree, node: NodeId, name: &str, out: &mut Vec<NodeId>) {
    let n = tree.get(node);
    if n.symbol == name {
        out.push(node);
        return;
    }
    for &child in &n.children {
        find_all(tree, child, name, out);
    }
}

/// Like [`find_all`] but only one level deep from `node`'s own children,
/// used where a sibling subtree must not be mistaken for a nested one
/// (e.g. an if-statement's then/else `masinstrucciones` blocks).
fn find_direct(tree: &ParseTree, node: NodeId, name: &str, out: &mut Vec<NodeId>) {
    for &child in &tree.get(node).children {
        if tree.get(child).symbol == name {
            out.push(child);
        } else {
            find_direct(tree, child, name, out);
        }
    }
}

fn first_terminal_lexeme(tree: &ParseTree, node: NodeId, terminal_symbol: &str) -> Option<String> {
    find_first(tree, node, terminal_symbol).and_then(|id| tree.get(id).lexeme.clone())
}

/// Mirrors [`Generator::emit_expr`]'s walk of the same grammar shape, but
/// only asks what the *left* operand's type is — enough to pick a `show`
/// syscall variant, since none of the binary operators produce `text`.
fn expr_type(
    tree: &ParseTree,
    node: NodeId,
    rib: RibId,
    scopes: &ScopeTree,
    strings: &StringTable,
) -> Option<Type> {
    let n = tree.get(node);
    let &head = n.children.first()?;
    match tree.get(head).symbol.as_str() {
        "(" => {
            let inner = *n.children.get(1)?;
            expr_type(tree, inner, rib, scopes, strings)
        }
        "id" => {
            let name = tree.get(head).lexeme.as_deref()?;
            let sym = strings.get(name)?;
            let opciones = n.children.get(1).copied();
            let record = scopes.resolve(rib, sym)?;
            if is_call_suffix(tree, opciones) {
                match record {
                    SymbolRecord::Function { return_type, .. } => Some(*return_type),
                    _ => None,
                }
            } else {
                match record {
                    SymbolRecord::Variable { ty } | SymbolRecord::Parameter { ty } => Some(*ty),
                    SymbolRecord::Function { .. } => None,
                }
            }
        }
        "valordato" => {
            let &term = tree.get(head).children.first()?;
            match tree.get(term).symbol.as_str() {
                "intliteral" => Some(Type::Int),
                "floatliteral" => Some(Type::Float),
                "stringliteral" => Some(Type::Text),
                "boolliteral" => Some(Type::Bool),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::registers::RegisterAllocator;

    #[test]
    fn register_allocator_is_deterministic_across_runs() {
        let mut a = RegisterAllocator::new();
        let mut b = RegisterAllocator::new();
        for _ in 0..10 {
            assert_eq!(a.next(), b.next());
        }
    }
}
