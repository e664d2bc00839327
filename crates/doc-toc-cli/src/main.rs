use std::process;

fn main() {
    match doc_toc_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("doc-toc error: {err}");
            process::exit(1);
        }
    }
}
