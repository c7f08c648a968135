//! ジョブテーブルとフォアグラウンド待機。
//!
//! バックグラウンドジョブの登録・削除・一覧（[`JobTable`]）と、
//! フォアグラウンドの子プロセス待機（[`wait_for_fg`]）を提供する。
//! バックグラウンドの回収は [`reaper`](crate::reaper) が担当し、
//! テーブルの変更は常に制御スレッドで行う。

use libc::pid_t;

// ── データ構造 ───────────────────────────────────────────────────────

/// バックグラウンドジョブ 1 件。
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    /// 子プロセスの PID。
    pub pid: pid_t,
    /// `[N]` 形式で表示されるジョブ番号。シェル全体で単調増加し、再利用しない。
    pub index: usize,
    /// 表示用コマンド文字列（末尾の `&` を除いたもの）。
    pub command: String,
}

// ── JobTable ─────────────────────────────────────────────────────────

/// ジョブテーブル。常にジョブ番号の昇順で並ぶ。
///
/// [`Shell`](crate::shell::Shell) が所有する。
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<JobEntry>,
    last_index: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            last_index: 0,
        }
    }

    /// ジョブを追加し、割り当てた番号を返す。
    ///
    /// 番号は前回の割り当て + 1。完了済みジョブの番号も再利用しない。
    /// 同じ PID のエントリが残っていれば置き換える（1 PID につき 1 エントリ）。
    pub fn insert(&mut self, pid: pid_t, command: String) -> usize {
        self.last_index += 1;
        let index = self.last_index;

        self.jobs.retain(|j| j.pid != pid);
        // 番号順の挿入位置を探す
        let pos = self.jobs.partition_point(|j| j.index < index);
        self.jobs.insert(pos, JobEntry { pid, index, command });
        index
    }

    /// PID でジョブを削除する。該当がなければ `None`。
    pub fn remove(&mut self, pid: pid_t) -> Option<JobEntry> {
        let pos = self.jobs.iter().position(|j| j.pid == pid)?;
        Some(self.jobs.remove(pos))
    }

    #[cfg(test)]
    fn get(&self, pid: pid_t) -> Option<&JobEntry> {
        self.jobs.iter().find(|j| j.pid == pid)
    }

    /// 全ジョブのイテレータ（番号昇順）。
    pub fn iter(&self) -> impl Iterator<Item = &JobEntry> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// `jobs` ビルトインの表示行を生成する。`[N]    command &` 形式。
    pub fn render(&self) -> Vec<String> {
        self.jobs
            .iter()
            .map(|j| format!("[{}]    {} &", j.index, j.command))
            .collect()
    }
}

// ── 待機ヘルパー ─────────────────────────────────────────────────────

/// `waitpid` の raw status を終了ステータスに変換する。
/// シグナル終了は 128 + シグナル番号。
pub fn exit_code(raw_status: i32) -> i32 {
    if libc::WIFEXITED(raw_status) {
        libc::WEXITSTATUS(raw_status)
    } else if libc::WIFSIGNALED(raw_status) {
        128 + libc::WTERMSIG(raw_status)
    } else {
        1
    }
}

/// フォアグラウンドの子プロセス `pid` が終了するまでブロックし、終了ステータスを返す。
///
/// 待機対象はこの PID のみ。バックグラウンドジョブは reaper 側で回収されるため、
/// ここで他の子を回収してしまうことはない。`EINTR` は再試行する。
pub fn wait_for_fg(pid: pid_t) -> i32 {
    loop {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(pid, &mut raw_status, 0) };
        if ret == pid {
            return exit_code(raw_status);
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        log::warn!("waitpid({}) failed: {}", pid, err);
        return 1;
    }
}
