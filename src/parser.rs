//! トークナイザ + 論理チェーン分割: 入力行を実行単位に切り出す文字列処理。
//!
//! すべての関数は入力の `&str` スライスを返すゼロコピー実装で、入力文字列を破壊的に
//! 書き換えない。再帰的なチェーン評価で同じ行を何度切り出しても安全。
//!
//! ## 対応構文
//!
//! - クォート: シングル (`'...'`) / ダブル (`"..."`)。同じ文字でのみ閉じる
//! - 引数上限: コマンド + 4 引数（[`Config::max_args`](crate::config::Config)）
//! - バックグラウンド実行: 末尾の `&`
//! - stderr リダイレクト: `2> file`（行全体に 1 つ）
//! - 外側の括弧: `(cmd)` → `cmd`
//! - 論理演算子: `&&`, `||`（最初に現れる演算子で 2 分割）

use std::borrow::Cow;

use crate::error::{Result, ShellError};

/// 論理演算子。
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Connector {
    /// `&&`: 左辺が成功した場合のみ右辺を実行
    And,
    /// `||`: 左辺が失敗した場合のみ右辺を実行
    Or,
}

// ── Tokenizer ───────────────────────────────────────────────────────

/// 入力文字列を生トークン（クォート込みのスライス）に分割するイテレータ。
///
/// クォートの外側の空白が区切り。`"` / `'` で開いた領域は同じ文字で閉じるまで
/// 空白を含めて 1 トークンになる。閉じられていないクォートは行末まで続く。
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let bytes = self.input.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        let mut quote: Option<u8> = None;
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b.is_ascii_whitespace() => break,
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None => {}
            }
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

/// トークンを囲む同一クォート文字のペアを 1 組だけ取り除く。
fn strip_enclosing_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// コマンド文字列を引数ベクタに分割する。
///
/// 各トークンは前後の空白を除去し、囲みクォートを剥がす。
/// トークン数が `max_args + 1` を超えると [`ShellError::ArgumentLimitExceeded`]。
/// 空入力は空ベクタ。
pub fn tokenize(input: &str, max_args: usize) -> Result<Vec<&str>> {
    let mut tokens = Vec::new();
    for raw in Tokenizer::new(input) {
        if tokens.len() > max_args {
            return Err(ShellError::ArgumentLimitExceeded { max: max_args });
        }
        tokens.push(strip_enclosing_quotes(raw.trim()));
    }
    Ok(tokens)
}

/// 文字列に `"` または `'` が含まれるか。クォート使用カウンタの判定に使う。
pub fn contains_quotes(s: &str) -> bool {
    s.contains(['"', '\''])
}

// ── 行レベルの切り出し ──────────────────────────────────────────────

/// 末尾の `&` を取り除き、バックグラウンド指定の有無を返す。
///
/// `sleep 5 &` → `("sleep 5", true)`。`&` 直前の空白も除去する。
pub fn strip_background(command: &str) -> (&str, bool) {
    let trimmed = command.trim_end();
    match trimmed.strip_suffix('&') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

/// 行から `2> target` を取り除き、残りの行とターゲットを返す。
///
/// ターゲットは `2>` の後の最初の空白区切りトークン。ターゲットより後ろのテキストは
/// 行に残る（`false 2> err.log && true` → `("false && true", Some("err.log"))`）。
/// `2>` がなければ入力をそのまま返す。
pub fn split_stderr_redirect(line: &str) -> Result<(Cow<'_, str>, Option<&str>)> {
    let Some(marker) = line.find("2>") else {
        return Ok((Cow::Borrowed(line), None));
    };

    let before = &line[..marker];
    let after = line[marker + 2..].trim_start();
    let target_end = after
        .find(|c: char| c.is_whitespace())
        .unwrap_or(after.len());
    let target = &after[..target_end];
    if target.is_empty() {
        return Err(ShellError::MissingRedirectTarget);
    }
    let rest = after[target_end..].trim_start();

    let command = if rest.is_empty() {
        before.trim_end().to_string()
    } else {
        format!("{} {}", before.trim_end(), rest)
    };
    Ok((Cow::Owned(command), Some(target)))
}

/// 最初の `(` と最後の `)` で囲まれた内側だけを返す。
///
/// 括弧の外側のテキストは捨てる。`(` が `)` より前にない場合は入力をそのまま返す。
pub fn strip_brackets(line: &str) -> &str {
    match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) if open < close => &line[open + 1..close],
        _ => line,
    }
}

/// 最初に現れる論理演算子で行を 2 分割する。
///
/// `&&` と `||` それぞれの最初の出現位置だけを比較し、前にある方で分割する。
/// 右辺に残った演算子は呼び出し側が再帰的に処理する。演算子がなければ `None`。
pub fn split_logical(line: &str) -> Option<(&str, Connector, &str)> {
    let and_pos = line.find("&&");
    let or_pos = line.find("||");

    let (pos, connector) = match (and_pos, or_pos) {
        (Some(a), Some(o)) if a < o => (a, Connector::And),
        (Some(a), None) => (a, Connector::And),
        (_, Some(o)) => (o, Connector::Or),
        (None, None) => return None,
    };
    Some((&line[..pos], connector, &line[pos + 2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── トークナイザ ──

    #[test]
    fn simple_command() {
        assert_eq!(tokenize("echo hello world", 4).unwrap(), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("", 4).unwrap().is_empty());
        assert!(tokenize("   \t ", 4).unwrap().is_empty());
    }

    #[test]
    fn extra_whitespace() {
        assert_eq!(tokenize("  ls   -l  ", 4).unwrap(), vec!["ls", "-l"]);
    }

    #[test]
    fn mixed_quotes() {
        assert_eq!(
            tokenize("\"a b\" 'c d' e", 4).unwrap(),
            vec!["a b", "c d", "e"],
        );
    }

    #[test]
    fn quote_closes_only_on_same_char() {
        assert_eq!(
            tokenize("echo \"it's here\"", 4).unwrap(),
            vec!["echo", "it's here"],
        );
    }

    #[test]
    fn inner_quotes_kept() {
        assert_eq!(tokenize("echo a\"b c\"d", 4).unwrap(), vec!["echo", "a\"b c\"d"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(tokenize("echo \"abc def", 4).unwrap(), vec!["echo", "\"abc def"]);
    }

    #[test]
    fn five_tokens_allowed() {
        assert_eq!(tokenize("a b c d e", 4).unwrap().len(), 5);
    }

    #[test]
    fn six_tokens_rejected() {
        let err = tokenize("a b c d e f", 4).unwrap_err();
        assert!(matches!(err, ShellError::ArgumentLimitExceeded { max: 4 }));
    }

    #[test]
    fn quoted_span_counts_as_one() {
        assert_eq!(tokenize("a 'b c d e f' g", 4).unwrap().len(), 3);
    }

    #[test]
    fn detects_quotes() {
        assert!(contains_quotes("echo 'x'"));
        assert!(contains_quotes("echo \"x\""));
        assert!(!contains_quotes("echo x"));
    }

    // ── バックグラウンド ──

    #[test]
    fn background_suffix() {
        assert_eq!(strip_background("sleep 5 &"), ("sleep 5", true));
        assert_eq!(strip_background("sleep 5&"), ("sleep 5", true));
        assert_eq!(strip_background("sleep 5"), ("sleep 5", false));
    }

    // ── stderr リダイレクト ──

    #[test]
    fn redirect_absent() {
        let (line, target) = split_stderr_redirect("ls -l").unwrap();
        assert_eq!(line, "ls -l");
        assert_eq!(target, None);
    }

    #[test]
    fn redirect_at_end() {
        let (line, target) = split_stderr_redirect("ls nope 2> err.log").unwrap();
        assert_eq!(line, "ls nope");
        assert_eq!(target, Some("err.log"));
    }

    #[test]
    fn redirect_keeps_chain_after_target() {
        let (line, target) = split_stderr_redirect("false 2> err.log && true").unwrap();
        assert_eq!(line, "false && true");
        assert_eq!(target, Some("err.log"));
    }

    #[test]
    fn redirect_without_space() {
        let (line, target) = split_stderr_redirect("ls 2>err.log").unwrap();
        assert_eq!(line, "ls");
        assert_eq!(target, Some("err.log"));
    }

    #[test]
    fn redirect_missing_target() {
        assert!(matches!(
            split_stderr_redirect("ls 2>   "),
            Err(ShellError::MissingRedirectTarget)
        ));
    }

    // ── 括弧 ──

    #[test]
    fn brackets_stripped() {
        assert_eq!(strip_brackets("(ls -l)"), "ls -l");
        assert_eq!(strip_brackets("  (true && false)  "), "true && false");
    }

    #[test]
    fn brackets_keep_only_interior() {
        assert_eq!(strip_brackets("(a) && b"), "a");
    }

    #[test]
    fn brackets_reversed_untouched() {
        assert_eq!(strip_brackets(") a ("), ") a (");
        assert_eq!(strip_brackets("no brackets"), "no brackets");
    }

    // ── 論理演算子 ──

    #[test]
    fn split_none() {
        assert_eq!(split_logical("echo hi"), None);
    }

    #[test]
    fn split_and() {
        assert_eq!(
            split_logical("true && echo hi"),
            Some(("true ", Connector::And, " echo hi")),
        );
    }

    #[test]
    fn split_or() {
        assert_eq!(
            split_logical("false || echo hi"),
            Some(("false ", Connector::Or, " echo hi")),
        );
    }

    #[test]
    fn and_before_or_wins() {
        assert_eq!(
            split_logical("a && b || c"),
            Some(("a ", Connector::And, " b || c")),
        );
    }

    #[test]
    fn or_before_and_wins() {
        assert_eq!(
            split_logical("a || b && c"),
            Some(("a ", Connector::Or, " b && c")),
        );
    }
}
