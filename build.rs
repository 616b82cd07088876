fn main() {
    println!("cargo:rerun-if-changed=tauri.conf.json");
    // WHY: tauri-build only exists with the desktop feature; headless builds skip codegen.
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
