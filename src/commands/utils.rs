use crate::decoder::SourceFormat;
use crate::job::Decompressor;
use crate::utils::config::SCHEMA_VERSION;
use clap::ValueEnum;

/// Display version information
pub fn display_version() {
    println!("dedup-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Summary Schema: v{}", SCHEMA_VERSION);
    println!("Source formats: {}", value_names(SourceFormat::value_variants()));
    println!("Decompressors:  {}", value_names(Decompressor::value_variants()));
    println!();
    println!("Converts deduplication traces into canonical chunk streams.");
}

fn value_names<T: ValueEnum>(variants: &[T]) -> String {
    variants
        .iter()
        .filter_map(|v| v.to_possible_value())
        .map(|v| v.get_name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
