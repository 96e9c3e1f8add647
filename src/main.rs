use std::{env, fs::read_to_string, path::Path, process, rc::Rc, time::Instant};

use fluid_parser::{display_error, lexer::lexer::tokenize, parser::parser::parse};
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let print_tokens = args.iter().any(|arg| arg == "--tokens");
    let paths: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();

    let [file_path] = paths.as_slice() else {
        eprintln!("usage: fluid_parser [--tokens] <file.fluid>");
        process::exit(2);
    };

    let file_name = Path::new(file_path.as_str())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string());

    let source = match read_to_string(file_path.as_str()) {
        Ok(source) => source,
        Err(err) => {
            error!(path = %file_path, %err, "failed to read source file");
            eprintln!("{}: {}", file_path, err);
            process::exit(1);
        }
    };

    let start = Instant::now();

    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(err) => {
            display_error(&err, &file_name, &source);
            process::exit(1);
        }
    };

    debug!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");

    if print_tokens {
        for token in &tokens {
            token.debug();
        }
    }

    let parse_start = Instant::now();
    let (_, result) = parse(tokens, Rc::new(file_name.clone()));

    debug!(elapsed = ?parse_start.elapsed(), "parsed");

    match result {
        Ok(chunk) => println!("{:#?}", chunk),
        Err(err) => {
            display_error(&err, &file_name, &source);
            process::exit(1);
        }
    }
}
