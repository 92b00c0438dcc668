fn main() {
    // Generate WinRT bindings for the package manager API
    #[cfg(feature = "winget-com")]
    {
        println!("cargo:rerun-if-env-changed=WINGET_INTEROP_WINMD");
        let winmd = std::env::var("WINGET_INTEROP_WINMD").expect(
            "WINGET_INTEROP_WINMD must point to Microsoft.Management.Deployment.winmd",
        );
        println!("cargo:rerun-if-changed={winmd}");

        let out_dir = std::env::var("OUT_DIR").unwrap();
        let out = std::path::Path::new(&out_dir).join("winget_bindings.rs");
        let out = out.to_string_lossy();

        let _ = windows_bindgen::bindgen([
            "--in",
            "default",
            "--in",
            winmd.as_str(),
            "--out",
            out.as_ref(),
            "--filter",
            "Microsoft.Management.Deployment",
            "--reference",
            "windows,skip-root,Windows",
            "--flat",
            "--no-comment",
        ]);
    }

    // Embed Windows version info
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "WinGet Interop");
        res.set("FileDescription", "Windows Package Manager interop library");
        res.set("OriginalFilename", "winget_interop.dll");
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.compile().unwrap();
    }
}
