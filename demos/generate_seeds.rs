//! Generate seed corpus for fuzzing
//!
//! Run from the repository root: cargo run --example generate_seeds

use std::fs;
use xen_rs::{serialize, Container, EncryptionMethod, Mode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    let sources_dir = "fuzz/corpus/sources";
    fs::create_dir_all(corpus_dir)?;
    fs::create_dir_all(sources_dir)?;

    println!("Generating seed corpus...");

    let source = |name: &str, data: &[u8]| -> std::io::Result<String> {
        let path = format!("{}/{}", sources_dir, name);
        fs::write(&path, data)?;
        Ok(path)
    };

    let mut seeds: Vec<(&str, Container)> = Vec::new();

    // Seed 1: Empty container
    seeds.push(("seed_empty.xen", Container::new()));

    // Seed 2: Metadata only
    {
        let mut container = Container::new();
        container.set_tag("author", "jane");
        container.set_list("damage", vec![10, -3, 255]);
        container.set_list("empty", Vec::new());
        seeds.push(("seed_metadata.xen", container));
    }

    // Seed 3: Multiple directories
    {
        let mut container = Container::new();
        container.add_file("sounds", "hit.wav", source("hit.wav", &[1, 2, 3])?);
        container.add_file("sounds", "empty.wav", source("empty.wav", b"")?);
        container.add_file("", "readme.txt", source("readme.txt", b"Hello, World!")?);
        seeds.push(("seed_multi.xen", container));
    }

    // Seed 4: Encryption-capable header
    {
        let mut container = Container::new();
        container.set_mode(Mode::EncryptionCapable);
        container.set_encryption(EncryptionMethod::Rx);
        let binary: Vec<u8> = (0..255).collect();
        container.add_file("bin", "binary.bin", source("binary.bin", &binary)?);
        seeds.push(("seed_dxen.xen", container));
    }

    for (name, container) in &seeds {
        let path = format!("{}/{}", corpus_dir, name);
        serialize(container, fs::File::create(&path)?)?;
        println!("✓ Generated: {}", path);
    }

    println!("\nGenerated {} seed files in {}", seeds.len(), corpus_dir);
    Ok(())
}
