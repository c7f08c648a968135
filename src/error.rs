//! シェル全体で使うエラー型。
//!
//! ユーザーエラー（エイリアス未定義、引数過多、`source` の検証失敗など）は
//! 検出したコンポーネントが `mish: ` 接頭辞付きで stderr に報告し、ループは継続する。
//! `Display` の文言はそのままユーザー向けメッセージとして使われる。

use std::io;

/// mish のエラー。
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// トークン数が「コマンド + `max` 個の引数」を超えた。
    #[error("more than {max} arguments")]
    ArgumentLimitExceeded { max: usize },

    /// `unalias` 対象のエイリアスが存在しない。
    #[error("unalias: {0}: alias not found")]
    AliasNotFound(String),

    /// `alias` の定義構文が不正。
    #[error("alias: {0}: invalid alias definition")]
    InvalidAlias(String),

    /// `source` にファイル名が指定されていない。
    #[error("source: filename argument required")]
    SourceUsage,

    #[error("source: {path}: {source}")]
    SourceOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    /// スクリプト名が `.sh` で終わっていない。
    #[error("source: {0}: the file does not end with .sh")]
    SourceExtension(String),

    /// 1 行目が shebang マーカーと一致しない。
    #[error("source: {0}: there is no #!/bin/bash")]
    SourceShebang(String),

    /// `source` のネストが深すぎる（自己参照スクリプト等）。
    #[error("source: maximum nesting depth {0} exceeded")]
    SourceDepth(usize),

    /// `2>` の後にファイル名がない。
    #[error("syntax error: missing redirect target")]
    MissingRedirectTarget,

    /// リダイレクト先ファイルのオープン、または fd 操作に失敗した。
    #[error("{target}: {source}")]
    Redirect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// `posix_spawnp` の失敗。`errno` は spawn が返した値。
    /// プログラムが見つからない・実行できない場合は `command not found` と表示する。
    #[error("{command}: {}", spawn_reason(.errno))]
    Spawn { command: String, errno: i32 },

    /// Reaper（SIGCHLD 監視スレッド）の起動に失敗した。
    #[error("failed to start job reaper: {0}")]
    Reaper(#[source] io::Error),
}

impl ShellError {
    /// エラーに対応する終了ステータスを返す。
    /// 127 = command not found, 126 = 実行権限なし, 1 = その他。
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Spawn { errno, .. } => match *errno {
                libc::ENOENT | libc::ENOTDIR | libc::ENAMETOOLONG | libc::ELOOP => 127,
                libc::EACCES | libc::ENOEXEC => 126,
                _ => 1,
            },
            _ => 1,
        }
    }

    /// シェル自体を続行できないエラーか。
    ///
    /// プロセス生成そのものの失敗（`EAGAIN`, `ENOMEM` など）と Reaper の起動失敗が該当する。
    /// プログラムが見つからない・実行できないだけなら致命的ではない。
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Spawn { errno, .. } => !is_exec_failure(*errno),
            Self::Reaper(_) => true,
            _ => false,
        }
    }
}

/// プログラムの検索・実行に失敗したことを示す errno か。
fn is_exec_failure(errno: i32) -> bool {
    matches!(
        errno,
        libc::ENOENT
            | libc::ENOTDIR
            | libc::ENAMETOOLONG
            | libc::ELOOP
            | libc::EACCES
            | libc::ENOEXEC
    )
}

fn spawn_reason(errno: &i32) -> String {
    if is_exec_failure(*errno) {
        "command not found".to_string()
    } else {
        io::Error::from_raw_os_error(*errno).to_string()
    }
}

/// 簡易エイリアス。
pub type Result<T> = std::result::Result<T, ShellError>;
