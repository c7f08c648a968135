//! シェルの動作定数。
//!
//! 設定ファイルやコマンドラインフラグは持たない。[`Config::default`] がシェルの既定動作で、
//! テストからは [`Shell::with_config`](crate::shell::Shell::with_config) で差し替える。

/// 実行エンジンが参照する上限値とマーカー文字列。
#[derive(Debug, Clone)]
pub struct Config {
    /// コマンド名を除く引数の最大個数。
    pub max_args: usize,
    /// シェルを終了させるコマンド名。
    pub exit_command: String,
    /// `source` が受け付けるスクリプトの拡張子。
    pub script_extension: String,
    /// スクリプト 1 行目に要求する shebang。
    pub shebang: String,
    /// `source` の最大ネスト深さ。
    pub max_source_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_args: 4,
            exit_command: "exit_shell".to_string(),
            script_extension: ".sh".to_string(),
            shebang: "#!/bin/bash".to_string(),
            max_source_depth: 64,
        }
    }
}
