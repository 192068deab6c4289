/// Basic example demonstrating container creation and reading
///
/// Run with: cargo run --example basic
use std::error::Error;
use std::fs;
use xen_rs::{ArchiveReader, ArchiveWriter, Container};

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== xen-rs Basic Example ===\n");

    println!("1. Creating container...");
    create_container()?;

    println!("\n2. Reading from container...");
    read_container()?;

    println!("\n✓ Example complete!");
    Ok(())
}

fn create_container() -> Result<(), Box<dyn Error>> {
    // Payloads are streamed from disk when the container is written
    fs::create_dir_all("example_assets")?;
    fs::write(
        "example_assets/readme.txt",
        b"This is a readme file for the basic example.",
    )?;
    fs::write(
        "example_assets/data.json",
        br#"{"name": "Basic Example", "version": "1.0.0"}"#,
    )?;
    fs::write("example_assets/hit.wav", [0x01, 0x02, 0x03])?;

    let mut container = Container::new();
    container.set_tag("author", "jane");
    container.set_list("damage", vec![10, -3, 255]);
    container.add_file("", "readme.txt", "example_assets/readme.txt");
    container.add_file("data", "data.json", "example_assets/data.json");
    container.add_file("sounds", "hit.wav", "example_assets/hit.wav");

    let mut writer = ArchiveWriter::create("example_basic.xen")?;
    writer.write_container(&container)?;
    writer.finalize()?;
    println!("   ✓ Container created: example_basic.xen");

    Ok(())
}

fn read_container() -> Result<(), Box<dyn Error>> {
    let reader = ArchiveReader::open("example_basic.xen")?;

    println!("   Tags:");
    for (name, value) in reader.container().tags() {
        println!("     {} = {}", name, value);
    }
    println!("   damage: {:?}", reader.list("damage").unwrap_or_default());

    println!("\n   Files in container:");
    for (dir, file) in reader.list_files() {
        println!("     - {}/{}", dir, file);
    }

    println!("\n   Reading readme.txt:");
    let readme = reader.read_file("", "readme.txt")?;
    println!("     {}", String::from_utf8_lossy(&readme));

    println!("\n   Reading data.json:");
    let json_data = reader.read_file("data", "data.json")?;
    let json: serde_json::Value = serde_json::from_slice(&json_data)?;
    println!("     Name: {}", json["name"]);
    println!("     Version: {}", json["version"]);

    let report = reader.extract_all("example_out")?;
    println!("\n   ✓ Extracted {} files to example_out/", report.extracted.len());

    Ok(())
}
