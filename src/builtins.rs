//! ビルトインコマンドの実装。
//!
//! ビルトインは子プロセスを起動せずシェル内で直接実行される。
//! `try_exec()` が `Some(ok)` を返せばビルトインとして処理済み、
//! `None` なら外部コマンドとして executor に委ねる。
//! `source` は `&` の除去と終了判定の後に executor から [`source`] として呼ばれる。

use std::io::Write;

use crate::alias;
use crate::error::{Result, ShellError};
use crate::executor;
use crate::shell::Shell;

/// ビルトインコマンドの実行を試みる。
///
/// 戻り値:
/// - `Some(true)` / `Some(false)`: ビルトインとして実行済み（成功 / 失敗）
/// - `None`: 該当するビルトインなし
pub fn try_exec(shell: &mut Shell, command: &str, out: &mut dyn Write) -> Option<bool> {
    let name = command.split_whitespace().next()?;
    match name {
        "alias" => Some(builtin_alias(shell, command, out)),
        "unalias" => Some(builtin_unalias(shell, command)),
        "jobs" if command == "jobs" => Some(builtin_jobs(shell, out)),
        _ => None,
    }
}

/// `alias`: 一覧表示。`alias name='value'`: 定義（既存なら上書き）。
fn builtin_alias(shell: &mut Shell, command: &str, out: &mut dyn Write) -> bool {
    if command == "alias" {
        for entry in shell.aliases.iter() {
            let _ = writeln!(out, "{}='{}'", entry.key, entry.value);
        }
        return true;
    }

    match alias::parse_alias_definition(command) {
        Ok((name, value)) => {
            log::debug!("alias {} -> {:?}", name, value);
            shell.aliases.define(name, value);
            true
        }
        Err(e) => {
            eprintln!("mish: {}", e);
            false
        }
    }
}

/// `unalias name`: エイリアスを削除する。未定義ならエラー表示のみ。
fn builtin_unalias(shell: &mut Shell, command: &str) -> bool {
    let Some(name) = command.split_whitespace().nth(1) else {
        eprintln!("mish: unalias: usage: unalias name");
        return false;
    };
    match shell.aliases.delete(name) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("mish: {}", e);
            false
        }
    }
}

/// `jobs`: 実行中のバックグラウンドジョブを番号昇順で表示する。
fn builtin_jobs(shell: &mut Shell, out: &mut dyn Write) -> bool {
    shell.reap();
    for line in shell.jobs.render() {
        let _ = writeln!(out, "{}", line);
    }
    true
}

/// `source file.sh`: スクリプトの各行を実行エンジンに流す。
///
/// ファイルの存在、拡張子、1 行目の shebang を検証し、通ればコマンド数を 1 つ増やしてから
/// 2 行目以降を 1 行ずつ [`executor::execute`] で実行する。空行と `#` で始まる行は飛ばす。
/// 各行はそれぞれ独立した文として `2>` を解釈する。終了要求が出たらそこで止まる。
pub fn source(shell: &mut Shell, operand: &str) -> Result<()> {
    let path = operand
        .split_whitespace()
        .next()
        .ok_or(ShellError::SourceUsage)?;

    if shell.source_depth >= shell.config.max_source_depth {
        return Err(ShellError::SourceDepth(shell.config.max_source_depth));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ShellError::SourceOpen {
        path: path.to_string(),
        source,
    })?;
    if !path.ends_with(shell.config.script_extension.as_str()) {
        return Err(ShellError::SourceExtension(path.to_string()));
    }

    let mut lines = content.lines();
    let first = lines.next().unwrap_or("").trim_end_matches('\r');
    if first != shell.config.shebang {
        return Err(ShellError::SourceShebang(path.to_string()));
    }

    shell.command_count += 1;
    shell.source_depth += 1;
    log::debug!("sourcing {} (depth {})", path, shell.source_depth);

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        shell.script_lines += 1;
        executor::execute(shell, line);
        if shell.should_exit {
            break;
        }
    }

    shell.source_depth -= 1;
    Ok(())
}
