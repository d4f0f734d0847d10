//! `roundtable extract` — show which paths a message would hand to the preprocessor.

use std::io::Read;

use roundtable_tools::extract_file_paths;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;

    match extract_file_paths(&text) {
        Some(paths) if !paths.is_empty() => {
            for path in &paths {
                println!("{path}");
            }
            Ok(())
        }
        Some(_) => Err("The <FilePath> block is empty".into()),
        None => Err("No complete <FilePath> block found".into()),
    }
}
