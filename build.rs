//! Build script that looks for the system pieces the mouse needs at run time
//! (OpenCV, X11 with XTest, a speech synthesizer) and prints install hints.

use std::env;
use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    check_opencv();

    if env::var("TARGET").unwrap_or_default().contains("linux") {
        check_x11();
        check_speech();
    }
}

fn pkg_config_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn check_opencv() {
    match pkg_config_version("opencv4").or_else(|| pkg_config_version("opencv")) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. The camera loop needs it.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev pkg-config");
            println!("cargo:warning=On macOS: brew install opencv pkg-config");
        }
    }
}

fn check_x11() {
    for (package, purpose, hint) in [
        ("x11", "Cursor control", "libx11-dev"),
        ("xtst", "Clicks, scrolling and key chords", "libxtst-dev"),
    ] {
        if pkg_config_version(package).is_none() {
            println!("cargo:warning={package} not found. {purpose} will not work.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install {hint}");
        }
    }
}

fn check_speech() {
    let on_path = |program: &str| {
        env::var_os("PATH").is_some_and(|paths| env::split_paths(&paths).any(|dir| Path::new(&dir).join(program).is_file()))
    };

    if !on_path("espeak") && !on_path("espeak-ng") {
        println!("cargo:warning=espeak not found. Spoken feedback needs a speech program.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install espeak-ng");
    }
}
