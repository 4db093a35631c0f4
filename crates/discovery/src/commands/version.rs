pub fn run() -> anyhow::Result<()> {
    println!("discovery {}", env!("CARGO_PKG_VERSION"));
    println!("BM25 search, suggestions and tag-based recommendation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        assert!(run().is_ok());
    }
}
