//! mish: `&&`/`||` チェーン、エイリアス、バックグラウンドジョブに対応した小さなシェル
//!
//! REPLループ: 終了ジョブの反映 → プロンプト表示 → 1 行読み取り → 実行 → ループ
//!
//! 実行エンジンの構成は `lib.rs` のモジュール表を参照。

use std::io::{self, BufRead, Write};

use mish::executor;
use mish::shell::Shell;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // シェル自体は SIGINT を無視する。子プロセスは posix_spawnattr の
    // POSIX_SPAWN_SETSIGDEF で SIG_DFL にリセットされる。
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
    }

    let mut shell = match Shell::new() {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("mish: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        // プロンプト前にバックグラウンドジョブの終了を反映
        shell.reap();

        print!("{}", shell.prompt());
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D): exit_shell と同じ終了処理
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                eprintln!("mish: {}", e);
                continue;
            }
            Err(e) => {
                eprintln!("mish: {}", e);
                break;
            }
        }

        let input = line.trim_end_matches(['\n', '\r']);
        executor::execute(&mut shell, input);

        if shell.should_exit {
            break;
        }
    }

    println!("{}", shell.quote_count);
    log::info!("shutting down after {} command(s)", shell.command_count);
    shell.shutdown();
    std::process::exit(0);
}
