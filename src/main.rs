use std::env;
use std::fs;
use std::process;

const USAGE: &str = "\
Usage: notemidi compile <input.txt> <output.mid> [--merge]
       notemidi dump <input.mid> [--json]
       notemidi assemble <input.txt> <output.mid>
       notemidi merge <input.mid> <output.mid>";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    let command = args[1].as_str();
    let input_path = &args[2];
    let output_path = args.get(3).filter(|arg| !arg.starts_with("--"));
    let has_flag = |flag: &str| args[3..].iter().any(|arg| arg == flag);

    match command {
        "compile" => {
            let output_path = require_output(output_path);
            let source = read_text(input_path);
            let result = if has_flag("--merge") {
                notemidi::compile_merged(&source)
            } else {
                notemidi::compile_to_smf(&source)
            };
            let bytes = exit_on_error("Compilation error", result);
            write_bytes(output_path, &bytes);
            eprintln!("Wrote MIDI to {}", output_path);
        }
        "dump" => {
            let midi = exit_on_error("Decode error", notemidi::decode(&read_bytes(input_path)));
            if has_flag("--json") {
                let json = exit_on_error("Dump error", notemidi::render_json(&midi));
                println!("{}", json);
            } else {
                print!("{}", notemidi::render_file(&midi));
            }
        }
        "assemble" => {
            let output_path = require_output(output_path);
            let midi = exit_on_error("Assembly error", notemidi::assemble(&read_text(input_path)));
            let bytes = exit_on_error("Encode error", notemidi::encode(&midi));
            write_bytes(output_path, &bytes);
            eprintln!("Wrote {} tracks to {}", midi.tracks.len(), output_path);
        }
        "merge" => {
            let output_path = require_output(output_path);
            let midi = exit_on_error("Decode error", notemidi::decode(&read_bytes(input_path)));
            let merged = exit_on_error("Merge error", notemidi::merge_file(&midi));
            let bytes = exit_on_error("Encode error", notemidi::encode(&merged));
            write_bytes(output_path, &bytes);
            eprintln!(
                "Merged {} tracks into {}",
                midi.tracks.len(),
                output_path
            );
        }
        _ => {
            eprintln!("Unknown command '{}'", command);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    }
}

fn require_output(path: Option<&String>) -> &String {
    match path {
        Some(path) => path,
        None => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    }
}

fn exit_on_error<T>(context: &str, result: Result<T, notemidi::MidiError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}: {}", context, e);
            process::exit(1);
        }
    }
}

fn read_text(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn read_bytes(path: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn write_bytes(path: &str, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing to '{}': {}", path, e);
        process::exit(1);
    }
}
