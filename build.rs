use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GIT_HASH");

    let build_time = chrono::Utc::now().to_rfc3339();
    println!("cargo:rustc-env=ENVGATE_BUILD_TIME={}", build_time);

    let hash = env::var("GIT_HASH").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=ENVGATE_GIT_HASH={}", hash);
}
