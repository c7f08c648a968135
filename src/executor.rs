//! コマンド実行: 論理チェーンの評価と単一コマンドの起動。
//!
//! - [`execute`]: 1 行（1 文）のトップレベル。`2> file` を取り出し、文全体の stderr を差し替える
//! - [`execute_chain`]: 外側の括弧を剥がし、最初の `&&` / `||` で 2 分割して短絡評価する（再帰）
//! - [`execute_command`]: ビルトイン判定 → `&` 除去 → 終了判定 → `source` →
//!   エイリアス展開 → トークン化 → `posix_spawnp`
//!   - foreground: その子だけを `waitpid` で待つ
//!   - background: Reaper に監視を依頼し、ジョブテーブルに登録して即座に返る

use std::io;
use std::os::unix::io::AsRawFd;

use crate::builtins;
use crate::error::ShellError;
use crate::job;
use crate::parser::{self, Connector};
use crate::redirect::{self, StderrGuard};
use crate::shell::Shell;
use crate::spawn;

/// ユーザーエラーを `mish: ` 接頭辞付きで stderr に報告する。
fn report(err: &ShellError) {
    eprintln!("mish: {}", err);
}

/// 1 行を文として実行し、最後に実行したコマンドが成功したかを返す。
///
/// `2>` の取り出しはここで 1 度だけ行う。ターゲットが開けなければ報告して行を破棄する。
/// 開けた場合は評価が終わるまでシェル自身の stderr もそのファイルに向け、
/// どの経路で抜けても [`StderrGuard`] の Drop で元に戻す。
pub fn execute(shell: &mut Shell, line: &str) -> bool {
    let (statement, target) = match parser::split_stderr_redirect(line) {
        Ok(split) => split,
        Err(e) => {
            report(&e);
            return false;
        }
    };

    let Some(target) = target else {
        return execute_chain(shell, &statement, None);
    };

    log::debug!("stderr of `{}` redirected to {}", statement.trim(), target);
    let file = match redirect::open_target(target) {
        Ok(f) => f,
        Err(e) => {
            report(&e);
            return false;
        }
    };
    let _guard = match StderrGuard::redirect_to(&file) {
        Ok(guard) => guard,
        Err(source) => {
            report(&ShellError::Redirect {
                target: target.to_string(),
                source,
            });
            return false;
        }
    };

    execute_chain(shell, &statement, Some(target))
}

/// 論理チェーンを評価する。
///
/// 外側の括弧を剥がしたあと、`&&` と `||` それぞれの最初の出現位置を比べて前にある方で分割する。
/// 左辺を実行し、`&&` なら成功時のみ、`||` なら失敗時のみ右辺を再帰的に評価する。
/// 右辺は新しい行として扱うが、`2>` は外側の文のものがそのまま有効。
pub fn execute_chain(shell: &mut Shell, line: &str, stderr_target: Option<&str>) -> bool {
    let line = parser::strip_brackets(line);

    let Some((left, connector, right)) = parser::split_logical(line) else {
        return execute_command(shell, line, stderr_target);
    };

    let ok = execute_command(shell, left, stderr_target);
    if shell.should_exit {
        return ok;
    }

    match connector {
        Connector::And if ok => execute_chain(shell, right, stderr_target),
        Connector::Or if !ok => execute_chain(shell, right, stderr_target),
        _ => {
            log::debug!("short-circuit ({:?}): skipping `{}`", connector, right.trim());
            ok
        }
    }
}

/// `&&` / `||` を含まない単一コマンドを実行し、成功したかを返す。
///
/// 成功した外部コマンドはコマンド数を 1 増やし、エイリアス展開後の文字列に `"` か `'` が含まれれば
/// クォート使用数も 1 増やす。失敗時はどちらも増やさない。
/// トークンが 1 つもなければ何もせず成功扱い（カウントしない）。
pub fn execute_command(shell: &mut Shell, command: &str, stderr_target: Option<&str>) -> bool {
    let command = command.trim();

    if let Some(ok) = builtins::try_exec(shell, command, &mut io::stdout()) {
        if ok {
            shell.command_count += 1;
        }
        return ok;
    }

    let (command, background) = parser::strip_background(command);

    if is_exit_command(shell, command) {
        log::debug!("exit requested by `{}`", command);
        shell.should_exit = true;
        return true;
    }

    if let Some(operand) = command.strip_prefix("source").filter(|rest| {
        rest.is_empty() || rest.starts_with(char::is_whitespace)
    }) {
        return match builtins::source(shell, operand) {
            Ok(()) => true,
            Err(e) => {
                report(&e);
                false
            }
        };
    }

    let expanded = shell.aliases.expand(command);
    if expanded != command {
        log::debug!("alias expanded: `{}` -> `{}`", command, expanded);
    }

    let args = match parser::tokenize(&expanded, shell.config.max_args) {
        Ok(args) => args,
        Err(e) => {
            report(&e);
            return false;
        }
    };
    if args.is_empty() {
        return true;
    }

    let ok = execute_external(shell, &args, &expanded, background, stderr_target);
    if ok {
        shell.command_count += 1;
        if parser::contains_quotes(&expanded) {
            shell.quote_count += 1;
        }
    }
    ok
}

/// `exit_shell`、または値が `exit_shell` のエイリアス名そのものか。
fn is_exit_command(shell: &Shell, command: &str) -> bool {
    let exit = shell.config.exit_command.as_str();
    command == exit || shell.aliases.lookup(command) == Some(exit)
}

/// 外部コマンドを子プロセスとして起動する。
///
/// `stderr_target` があればコマンドごとにターゲットを作り直し（切り詰め）、子の stderr に接続する。
/// コマンドが見つからない場合は `<command>: command not found` を表示して失敗を返す。
/// プロセス生成そのものに失敗した場合（`EAGAIN`, `ENOMEM` など）はシェルを終了する。
/// background なら `[N] pid` を表示して即座に成功を返す。
fn execute_external(
    shell: &mut Shell,
    args: &[&str],
    command_text: &str,
    background: bool,
    stderr_target: Option<&str>,
) -> bool {
    let stderr_file = match stderr_target.map(redirect::open_target).transpose() {
        Ok(file) => file,
        Err(e) => {
            report(&e);
            return false;
        }
    };

    let spawned = spawn::spawn(
        args,
        stderr_file.as_ref().map(|f| f.as_raw_fd()),
        background,
    );
    // 子に渡した fd は親側では不要
    drop(stderr_file);

    let pid = match spawned {
        Ok(pid) => pid,
        Err(e) if e.is_fatal() => {
            eprintln!("mish: {}", e);
            log::error!("cannot create process for `{}`: {}", args[0], e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            log::debug!("spawn of `{}` failed with status {}", args[0], e.exit_status());
            return false;
        }
    };

    if background {
        let index = shell.register_job(pid, command_text.trim().to_string());
        println!("[{}] {}", index, pid);
        log::info!("job [{}] started: pid {} `{}`", index, pid, command_text.trim());
        return true;
    }

    let status = job::wait_for_fg(pid);
    log::debug!("`{}` (pid {}) exited with status {}", args[0], pid, status);
    status == 0
}
