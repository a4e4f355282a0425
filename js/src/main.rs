use ecmascript::*;
use std::path::PathBuf;

#[derive(clap::Parser)]
#[command(name = "js", version, about = "ECMAScript engine runner")]
struct Cli {
    /// Execute script
    #[arg(short, long)]
    eval: Option<String>,

    /// Run every script in strict mode
    #[arg(long)]
    strict: bool,

    /// Skip the constant-folding pass
    #[arg(long)]
    no_optimize: bool,

    /// Print the compiled bytecode instead of running the script
    #[arg(long)]
    dump_bytecode: bool,

    /// JavaScript file to execute
    file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Initialize logger (controlled by RUST_LOG)
    env_logger::init();

    #[cfg(windows)]
    {
        // The default 1MB main-thread stack is too small for deeply nested scripts.
        let builder = std::thread::Builder::new().stack_size(8 * 1024 * 1024);
        let handler = builder.spawn(run_main)?;
        return handler.join().map_err(|_| "runner thread panicked")?;
    }

    #[cfg(not(windows))]
    run_main()
}

fn run_main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = <Cli as clap::Parser>::parse();

    let options = EngineOptions {
        strict: cli.strict,
        optimize: !cli.no_optimize,
        source_path: cli.file.clone(),
        ..EngineOptions::default()
    };

    let script_content = if let Some(script) = cli.eval {
        script
    } else if let Some(ref file) = cli.file {
        match read_script_file(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file {}: {}", file.display(), e.user_message());
                std::process::exit(1);
            }
        }
    } else {
        // No script argument -> start the interactive, persistent REPL
        run_persistent_repl(options)?;
        return Ok(());
    };

    let mut engine = Engine::with_options(options)?;

    if cli.dump_bytecode {
        match engine.disassemble(&script_content) {
            Ok(listing) => print!("{listing}"),
            Err(err) => {
                eprintln!("{}", err.user_message());
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    match engine.evaluate_to_string(&script_content, cli.file.as_deref()) {
        Ok(result) => println!("{result}"),
        Err(err) => {
            eprintln!("{}", err.user_message());
            for frame in err.stack() {
                eprintln!("    {frame}");
            }
            if let Some(file_path) = cli.file.as_ref() {
                if let (Some(line), Some(col)) = (err.js_line(), err.js_column()) {
                    eprintln!("  in file: {}:{}:{}", file_path.display(), line, col);
                } else {
                    eprintln!("  in file: {}", file_path.display());
                }
            }
            std::process::exit(1);
        }
    }
    Ok(())
}

// Persistent rustyline-powered REPL: one engine, so bindings survive between lines.
#[allow(clippy::println_empty_string)]
fn run_persistent_repl(options: EngineOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use rustyline::Editor;
    use rustyline::error::ReadlineError;

    let ver = clap::crate_version!();
    println!("ECMAScript REPL (persistent environment) v{ver}. Type 'exit' or Ctrl-D to quit.");

    let mut rl = match Editor::<(), rustyline::history::FileHistory>::new() {
        Ok(e) => e,
        Err(err) => {
            eprintln!("Failed to initialize line editor: {err}");
            std::process::exit(1);
        }
    };

    let history_path: Option<PathBuf> = std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".js_repl_history"));
    if let Some(ref p) = history_path
        && let Err(e) = rl.load_history(p)
    {
        log::debug!("no REPL history loaded from {}: {e}", p.display());
    }

    let mut engine = Engine::with_options(options)?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "js> " } else { ".... " };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && (trimmed == "exit" || trimmed == ".exit") {
                    break;
                }

                if buffer.is_empty() {
                    buffer = line;
                } else {
                    buffer.push('\n');
                    buffer.push_str(&line);
                }

                // unclosed brackets, template substitutions or comments: keep reading
                if !is_complete_input(&buffer) {
                    continue;
                }

                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }

                rl.add_history_entry(buffer.clone())?;

                match engine.evaluate_to_string(&buffer, None) {
                    Ok(val) => println!("{val}"),
                    Err(e) => {
                        eprintln!("{}", e.user_message());
                        if buffer.lines().count() == 1 {
                            eprintln!("  at: {}", buffer.trim());
                        } else {
                            eprintln!("  in:");
                            for line in buffer.lines() {
                                eprintln!("    {line}");
                            }
                        }
                    }
                }

                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                println!("");
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    if let Some(ref p) = history_path {
        rl.save_history(p)?;
    }
    Ok(())
}
