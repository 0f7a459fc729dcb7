use std::env;
use std::fs;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: snarlc <file.snarl> [out.asm]");
        process::exit(1);
    }
    let out_path = args.get(2).map(String::as_str).unwrap_or("out.asm");

    let source = fs::read_to_string(&args[1]).unwrap_or_else(|err| {
        eprintln!("Failed to read {}: {}", args[1], err);
        process::exit(1);
    });

    match snarl_compiler::compile(&source) {
        Ok(assembly) => {
            if let Err(err) = fs::write(out_path, assembly) {
                eprintln!("Failed to write {out_path}: {err}");
                process::exit(1);
            }
        }
        Err(diag) => {
            println!("{}", diag.render(&source));
            process::exit(1);
        }
    }
}
