use clap::Parser;
use mipsc_drv::config::{CliArgs, Command, EmitKind};
use mipsc_drv::{Config, Session};
use mipsc_par::{NodeId, ParseTree};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let verbose = matches!(&args.command, Command::Build { verbose: true, .. });
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("MIPSC_LOG").unwrap_or_else(|_| filter.to_string()),
        ))
        .with_target(false)
        .init();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Build { source, grammar, table, output, emit, verbose, warnings_as_errors } => {
            let config = Config {
                source_path: source,
                grammar_path: grammar,
                table_path: table,
                output_path: output,
                emit,
                verbose,
                warnings_as_errors,
            };
            let output_path = config.resolved_output_path();
            let mut session = Session::new(config);
            let result = session.compile();
            report_diagnostics(&session);
            let output = result?;
            match emit {
                EmitKind::Tokens => print_tokens(&output.tokens),
                EmitKind::Grammar => println!("grammar loaded with no errors"),
                EmitKind::Table => println!("table built with no errors"),
                EmitKind::ParseTree => {
                    if let Some(tree) = &output.parse_tree {
                        print_tree(tree);
                    }
                }
                EmitKind::Symbols => {
                    if let Some(scopes) = &output.scopes {
                        println!("{} rib(s)", scopes.ribs.len());
                    }
                }
                EmitKind::Asm => {
                    if let Some(asm) = &output.asm {
                        std::fs::write(&output_path, asm)?;
                        println!("wrote {}", output_path.display());
                    }
                }
            }
            Ok(())
        }
        Command::EmitTable { grammar, output } => {
            let config = Config {
                source_path: grammar.clone(),
                grammar_path: grammar,
                table_path: None,
                output_path: Some(output.clone()),
                emit: EmitKind::Table,
                verbose: false,
                warnings_as_errors: false,
            };
            let mut session = Session::new(config);
            let grammar_text = std::fs::read_to_string(&session.config.grammar_path)?;
            let known_terminals: std::collections::HashSet<&str> =
                mipsc_lex::TERMINAL_ALPHABET.iter().copied().collect();
            let parsed = mipsc_grammar::load(
                &grammar_text,
                &session.config.grammar_path.display().to_string(),
                &known_terminals,
                &session.handler,
            )?;
            let first = mipsc_table::compute_first_sets(&parsed);
            let follow = mipsc_table::compute_follow_sets(&parsed, &first);
            let mut terminal_order: Vec<String> = known_terminals
                .iter()
                .filter(|t| **t != "$")
                .map(|t| t.to_string())
                .collect();
            terminal_order.sort();
            terminal_order.push("$".to_string());
            let table =
                mipsc_table::build_table(&parsed, &first, &follow, &terminal_order, &session.handler);
            report_diagnostics(&session);
            if session.handler.has_errors() {
                anyhow::bail!("refusing to write a table with LL(1) conflicts");
            }
            let file = std::fs::File::create(&output)?;
            mipsc_table::write_csv(&table, file)?;
            println!("wrote {}", output.display());
            Ok(())
        }
        Command::DumpTokens { source } => {
            let config = Config {
                source_path: source,
                grammar_path: "/dev/null".into(),
                table_path: None,
                output_path: None,
                emit: EmitKind::Tokens,
                verbose: false,
                warnings_as_errors: false,
            };
            let mut session = Session::new(config);
            let result = session.compile();
            report_diagnostics(&session);
            print_tokens(&result?.tokens);
            Ok(())
        }
        Command::DumpTree { source, grammar, table } => {
            let config = Config {
                source_path: source,
                grammar_path: grammar,
                table_path: table,
                output_path: None,
                emit: EmitKind::ParseTree,
                verbose: false,
                warnings_as_errors: false,
            };
            let mut session = Session::new(config);
            let result = session.compile();
            report_diagnostics(&session);
            if let Some(tree) = &result?.parse_tree {
                print_tree(tree);
            }
            Ok(())
        }
    }
}

fn print_tokens(tokens: &[mipsc_lex::Token]) {
    for token in tokens {
        println!(
            "{:>4}:{:<4} {}",
            token.span.line, token.span.column, token.kind
        );
    }
}

fn print_tree(tree: &ParseTree) {
    if let Some(root) = tree.root() {
        print_node(tree, root, 0);
    }
}

fn print_node(tree: &ParseTree, id: NodeId, depth: usize) {
    let node = tree.get(id);
    let indent = "  ".repeat(depth);
    match &node.lexeme {
        Some(lexeme) => println!("{indent}{} `{lexeme}`", node.symbol),
        None => println!("{indent}{}", node.symbol),
    }
    for child in &node.children {
        print_node(tree, *child, depth + 1);
    }
}

fn report_diagnostics(session: &Session) {
    for diagnostic in session.handler.diagnostics() {
        eprintln!("{}", diagnostic);
    }
}
