//! mish ライブラリ: ベンチマーク・テスト用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//! この `lib.rs` は `benches/bench_main.rs` 等の外部クレートから
//! トークナイザ・エイリアス・実行エンジンに直接アクセスするために存在する。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`parser`] | トークナイザ（クォート、引数上限）と行の切り出し（`2>`、括弧、`&&`/`||`、末尾 `&`） |
//! | [`alias`] | エイリアステーブル（定義・上書き・削除・一覧、先頭ワードのリテラル置換） |
//! | [`executor`] | 論理チェーンの再帰評価、ビルトイン判定、外部コマンドの起動と待機 |
//! | [`builtins`] | ビルトイン（`alias`, `unalias`, `jobs`, `source`） |
//! | [`job`] | ジョブテーブル（番号昇順）とフォアグラウンド待機 |
//! | [`reaper`] | SIGCHLD 監視スレッド。終了したバックグラウンド PID をチャネルで届ける |
//! | [`redirect`] | `2> file` の間だけ stderr を差し替える RAII ガード |
//! | [`spawn`] | `posix_spawnp` ラッパー |
//! | [`shell`] | シェルの実行状態（テーブル、カウンタ、Reaper） |
//! | [`config`] | 動作定数（引数上限、終了コマンド、shebang など） |
//! | [`error`] | エラー型 [`ShellError`](error::ShellError) |

pub mod alias;
pub mod builtins;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod parser;
pub mod reaper;
pub mod redirect;
pub mod shell;
pub mod spawn;
