use bpetok::{Result, TokenId, Tokenizer, TokenizerError};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

enum Mode {
    Encode,
    Count,
    Decode,
    Roundtrip,
}

struct Args {
    merges: Option<String>,
    mode: Mode,
    help: bool,
    version: bool,
    paths: Vec<String>,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args {
        merges: None,
        mode: Mode::Encode,
        help: false,
        version: false,
        paths: Vec::new(),
    };

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "-V" | "--version" => args.version = true,
            "-h" | "--help" => args.help = true,
            "-c" | "--count" => args.mode = Mode::Count,
            "-d" | "--decode" => args.mode = Mode::Decode,
            "--roundtrip" => args.mode = Mode::Roundtrip,
            "-m" | "--merges" => {
                i += 1;
                if i >= argv.len() {
                    eprintln!("Error: --merges requires a value");
                    std::process::exit(1);
                }
                args.merges = Some(argv[i].clone());
            }
            s if s.starts_with('-') => {
                eprintln!("Error: unknown option: {}", s);
                std::process::exit(1);
            }
            _ => args.paths.push(argv[i].clone()),
        }
        i += 1;
    }
    args
}

fn print_help() {
    println!(
        "Usage: bpetok -m <merges.json> [options] [path...]\n\
         \n\
         Encode and decode text with a trained BPE merge table.\n\
         \n\
         Options:\n\
         \x20 -m, --merges <file>  Merge-table JSON artifact (required)\n\
         \x20 -c, --count          Print token counts instead of token IDs\n\
         \x20 -d, --decode         Input is comma-separated token IDs; print text\n\
         \x20 --roundtrip          Verify decode(encode(text)) == text\n\
         \x20 -V, --version        Show version\n\
         \x20 -h, --help           Show this help\n\
         \n\
         When no paths are given, reads from stdin. With several paths the\n\
         default and --count modes print one count per file plus a total."
    );
}

fn load_tokenizer(path: &str) -> Tokenizer {
    Tokenizer::from_file(path.as_ref()).unwrap_or_else(|e| {
        eprintln!("Error loading merge table: {}", e);
        std::process::exit(1);
    })
}

struct Input {
    name: Option<String>,
    text: String,
}

fn read_inputs(paths: &[String]) -> Vec<Input> {
    if paths.is_empty() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(1);
        });
        return vec![Input {
            name: None,
            text: buf,
        }];
    }
    paths
        .iter()
        .map(|p| {
            let path = PathBuf::from(p);
            let text = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", path.display(), e);
                std::process::exit(1);
            });
            Input {
                name: Some(p.clone()),
                text,
            }
        })
        .collect()
}

fn parse_id_list(text: &str) -> Result<Vec<TokenId>> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<TokenId>()
                .map_err(|_| TokenizerError::InvalidInput(format!("invalid token id: {:?}", s)))
        })
        .collect()
}

fn compression_ratio(byte_len: usize, token_len: usize) -> f64 {
    if token_len == 0 {
        0.0
    } else {
        byte_len as f64 / token_len as f64
    }
}

fn format_line(count: &str, label: &str) -> String {
    format!("{:>8} {}\n", count, label)
}

fn main() {
    let args = parse_args();

    if args.version {
        println!("bpetok {}", VERSION);
        return;
    }
    if args.help {
        print_help();
        return;
    }

    let Some(merges_path) = args.merges.as_deref() else {
        eprintln!("Error: --merges is required (see --help)");
        std::process::exit(1);
    };
    let tok = load_tokenizer(merges_path);
    let inputs = read_inputs(&args.paths);
    let use_parallel = inputs.len() > 1;

    match args.mode {
        Mode::Decode => {
            for input in &inputs {
                let ids = parse_id_list(&input.text).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });
                match tok.decode(&ids) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Mode::Roundtrip => {
            for input in &inputs {
                let ids = tok.encode(&input.text);
                let decoded = tok.decode(&ids).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });
                let label = input.name.as_deref().unwrap_or("stdin");
                if decoded == input.text {
                    println!(
                        "{}: ok ({} bytes -> {} tokens, {:.2}X)",
                        label,
                        input.text.len(),
                        ids.len(),
                        compression_ratio(input.text.len(), ids.len())
                    );
                } else {
                    eprintln!("{}: round-trip mismatch", label);
                    std::process::exit(1);
                }
            }
        }
        Mode::Encode if inputs.len() == 1 => {
            let text = &inputs[0].text;
            let ids = tok.encode(text);
            let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            println!("{}", rendered.join(","));
            eprintln!(
                "{} bytes -> {} tokens ({:.2}X)",
                text.len(),
                ids.len(),
                compression_ratio(text.len(), ids.len())
            );
        }
        Mode::Encode | Mode::Count => {
            let count_one = |input: &Input| tok.encode(&input.text).len();
            let counts: Vec<usize> = if use_parallel {
                inputs.par_iter().map(count_one).collect()
            } else {
                inputs.iter().map(count_one).collect()
            };
            let total: usize = counts.iter().sum();
            if inputs.len() > 1 {
                for (input, count) in inputs.iter().zip(counts.iter()) {
                    print!(
                        "{}",
                        format_line(&count.to_string(), input.name.as_deref().unwrap_or(""))
                    );
                }
                print!("{}", format_line(&total.to_string(), "total"));
            } else {
                print!(
                    "{}",
                    format_line(&total.to_string(), inputs[0].name.as_deref().unwrap_or(""))
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_id_list("256, 257,104").unwrap(), vec![256, 257, 104]);
        assert_eq!(parse_id_list("").unwrap(), Vec::<TokenId>::new());
        assert_eq!(parse_id_list("256,,257").unwrap(), vec![256, 257]);
    }

    #[test]
    fn bad_id_is_invalid_input() {
        for text in ["256,abc", "-1", "1.5", "256 257"] {
            let err = parse_id_list(text).unwrap_err();
            assert!(
                matches!(err, TokenizerError::InvalidInput(_)),
                "{text:?} should fail as invalid input"
            );
        }
    }
}
