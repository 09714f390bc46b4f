use std::process::Command;

/// 运行命令并取其第一行输出，失败时返回 "unknown"
fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| String::from("unknown"))
}

fn main() {
    // 设置构建时间戳
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );

    // 获取 Git 提交信息与 Rust 版本
    println!(
        "cargo:rustc-env=GIT_COMMIT={}",
        command_output("git", &["rev-parse", "--short", "HEAD"])
    );
    println!(
        "cargo:rustc-env=RUST_VERSION={}",
        command_output("rustc", &["--version"])
    );

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
