use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=MYSQLCLIENT_LIB_DIR");
    println!("cargo:rerun-if-env-changed=MYSQLCLIENT_LIB");

    if let Ok(dir) = env::var("MYSQLCLIENT_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    #[cfg(target_os = "macos")]
    {
        // Homebrew installs the client library outside the default search path.
        println!("cargo:rustc-link-search=native=/opt/homebrew/opt/mysql-client/lib");
        println!("cargo:rustc-link-search=native=/usr/local/opt/mysql-client/lib");
    }

    #[cfg(target_os = "windows")]
    let default_lib = "libmysql";
    #[cfg(not(target_os = "windows"))]
    let default_lib = "mysqlclient";

    let lib = env::var("MYSQLCLIENT_LIB").unwrap_or_else(|_| default_lib.to_string());
    println!("cargo:rustc-link-lib={}", lib);
}
