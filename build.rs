fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The server side is only built for the mock used in integration tests.
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&["proto/logstore.proto"], &["proto"])?;
    println!("cargo:rerun-if-changed=proto/logstore.proto");
    Ok(())
}
