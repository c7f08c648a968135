//! シェルの実行状態を保持するモジュール。
//!
//! エイリアステーブル、ジョブテーブル、各種カウンタ、Reaper を 1 つの [`Shell`] にまとめ、
//! evaluator / executor / builtins に `&mut` で渡す。起動時に 1 度だけ構築し、
//! 終了コマンドで [`Shell::shutdown`] により破棄する。

use libc::pid_t;

use crate::alias::AliasTable;
use crate::config::Config;
use crate::error::Result;
use crate::job::JobTable;
use crate::reaper::Reaper;

/// シェルの実行状態。REPLループ全体で共有される。
pub struct Shell {
    /// 動作定数。
    pub config: Config,
    /// エイリアステーブル。`alias name='value'` で定義される。
    pub aliases: AliasTable,
    /// バックグラウンドジョブのテーブル。変更は制御スレッドのみが行う。
    pub jobs: JobTable,
    /// 終了した子の PID を届ける SIGCHLD 監視スレッド。
    reaper: Reaper,
    /// 成功したコマンド数（プロンプトの `#cmd`）。
    pub command_count: usize,
    /// クォートを含み成功したコマンド数。終了時に表示する。
    pub quote_count: usize,
    /// `source` で実行したスクリプト行数（プロンプトの `#script lines`）。
    pub script_lines: usize,
    /// 終了コマンドで true にセットされ、チェーン評価と REPL ループを止める。
    pub should_exit: bool,
    /// 実行中の `source` のネスト深さ。
    pub source_depth: usize,
}

impl Shell {
    /// 既定の設定でシェルを構築し、Reaper を起動する。
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            aliases: AliasTable::new(),
            jobs: JobTable::new(),
            reaper: Reaper::start()?,
            command_count: 0,
            quote_count: 0,
            script_lines: 0,
            should_exit: false,
            source_depth: 0,
        })
    }

    /// 終了した子を回収し、その通知をジョブテーブルに反映する。
    ///
    /// 監視スレッドの処理を待たず、この場で一度回収を走らせてから通知を受け取る。
    /// プロンプト表示前、`jobs` の前、ジョブ登録の前に呼ばれる。
    pub fn reap(&mut self) {
        self.reaper.poll();
        for pid in self.reaper.drain() {
            if let Some(job) = self.jobs.remove(pid) {
                log::info!("job [{}] {} removed ({})", job.index, job.pid, job.command);
            }
        }
    }

    /// バックグラウンドで起動した子を Reaper の監視下に置き、ジョブ番号を割り当てる。
    pub fn register_job(&mut self, pid: pid_t, command: String) -> usize {
        self.reap();
        self.reaper.watch(pid);
        self.jobs.insert(pid, command)
    }

    /// `#cmd:N|#alias:N|#script lines:N> ` 形式のプロンプト。
    pub fn prompt(&self) -> String {
        format!(
            "#cmd:{}|#alias:{}|#script lines:{}> ",
            self.command_count,
            self.aliases.len(),
            self.script_lines
        )
    }

    /// テーブルを解放し、Reaper を停止する。
    pub fn shutdown(self) {
        if !self.jobs.is_empty() {
            log::info!("exiting with {} background job(s) still running", self.jobs.len());
        }
        log::debug!(
            "releasing {} alias(es) and {} job(s)",
            self.aliases.len(),
            self.jobs.len()
        );
        // Reaper の Drop が監視スレッドを止めて join する
        drop(self);
    }
}
