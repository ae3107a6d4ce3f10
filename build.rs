fn main() {
    // The webview backend and the splash helper both link wry, which on Windows
    // needs advapi32 (ETW + registry). Some CI link environments miss it.
    if cfg!(target_os = "windows") {
        println!("cargo:rustc-link-lib=advapi32");
    }
}
