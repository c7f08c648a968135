//! エイリアステーブル。
//!
//! `alias name='value'` で定義され、コマンド先頭のワードをテキスト置換する。
//! 置換はワード単位ではなくリテラルな接頭辞置換で、再帰展開もしない。
//! 値が単語の途中で終わっていれば、残りの行がそのまま連結される。

use std::borrow::Cow;

use crate::error::{Result, ShellError};

/// エイリアス 1 件。
#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub key: String,
    pub value: String,
}

/// エイリアステーブル。定義順を保持する。
///
/// [`Shell`](crate::shell::Shell) が所有し、プロセス終了まで生存する。
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// エイリアスを定義する。既存キーなら値をその場で上書きする（位置は変わらない）。
    pub fn define(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value.to_string(),
            None => self.entries.push(AliasEntry {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// エイリアスを削除する。存在しなければ [`ShellError::AliasNotFound`]。
    pub fn delete(&mut self, key: &str) -> Result<()> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.key == key)
            .ok_or_else(|| ShellError::AliasNotFound(key.to_string()))?;
        self.entries.remove(idx);
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// 全エントリのイテレータ（定義順）。
    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 行の最初のワードがエイリアスならその値に置換する。
    ///
    /// 結果は「値 + 元のワード直後からの残り全部」。先頭の空白は無視する。
    /// 該当しなければゼロコピーの `Cow::Borrowed` を返す。
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let trimmed = line.trim_start();
        let word_end = trimmed
            .find(|c: char| c.is_whitespace())
            .unwrap_or(trimmed.len());
        let first_word = &trimmed[..word_end];
        if first_word.is_empty() {
            return Cow::Borrowed(line);
        }

        match self.lookup(first_word) {
            Some(value) => Cow::Owned(format!("{}{}", value, &trimmed[word_end..])),
            None => Cow::Borrowed(line),
        }
    }
}

/// `alias` 定義文を `(name, value)` に分解する。
///
/// 受け付ける形式: `alias NAME='VALUE'`, `alias NAME ='VALUE'`, `alias NAME= 'VALUE'`。
/// 値は `'` または `"` で囲み、同じ文字で閉じる。閉じクォート以降は無視する。
pub fn parse_alias_definition(line: &str) -> Result<(&str, &str)> {
    let invalid = || ShellError::InvalidAlias(line.trim().to_string());

    let body = line
        .trim_start()
        .strip_prefix("alias")
        .ok_or_else(invalid)?
        .trim_start();
    let (name, rest) = body.split_once('=').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"').ok_or_else(invalid)?;
    let inner = &rest[1..];
    let end = inner.find(quote).ok_or_else(invalid)?;
    Ok((name, &inner[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        assert_eq!(t.lookup("ll"), Some("ls -l"));
        assert_eq!(t.lookup("la"), None);
    }

    #[test]
    fn redefine_overwrites_in_place() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        t.define("g", "grep");
        t.define("ll", "ls -la");
        assert_eq!(t.len(), 2);
        assert_eq!(t.lookup("ll"), Some("ls -la"));
        let keys: Vec<&str> = t.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["ll", "g"]);
    }

    #[test]
    fn delete_existing() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        t.delete("ll").unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn delete_missing_leaves_table() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        assert!(matches!(t.delete("nope"), Err(ShellError::AliasNotFound(k)) if k == "nope"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn expand_first_word() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        assert_eq!(t.expand("ll /tmp"), "ls -l /tmp");
        assert_eq!(t.expand("ll"), "ls -l");
    }

    #[test]
    fn expand_only_leading_word() {
        let mut t = AliasTable::new();
        t.define("ll", "ls -l");
        assert_eq!(t.expand("echo ll"), "echo ll");
        assert!(matches!(t.expand("echo ll"), Cow::Borrowed(_)));
    }

    #[test]
    fn expand_is_literal_concatenation() {
        let mut t = AliasTable::new();
        t.define("l", "ls ");
        // 値と残りの行の間の空白は補正しない
        assert_eq!(t.expand("l  -a"), "ls   -a");
        assert_eq!(t.expand("  l"), "ls ");
    }

    #[test]
    fn expand_does_not_recurse() {
        let mut t = AliasTable::new();
        t.define("a", "b");
        t.define("b", "echo loop");
        assert_eq!(t.expand("a 1"), "b 1");
    }

    // ── 定義文パース ──

    #[test]
    fn parse_single_quoted() {
        assert_eq!(parse_alias_definition("alias ll='ls -l'").unwrap(), ("ll", "ls -l"));
    }

    #[test]
    fn parse_space_before_equals() {
        assert_eq!(parse_alias_definition("alias ll ='ls -l'").unwrap(), ("ll", "ls -l"));
    }

    #[test]
    fn parse_space_after_equals() {
        assert_eq!(parse_alias_definition("alias ll= 'ls -l'").unwrap(), ("ll", "ls -l"));
    }

    #[test]
    fn parse_double_quoted() {
        assert_eq!(parse_alias_definition("alias q=\"echo 'hi'\"").unwrap(), ("q", "echo 'hi'"));
    }

    #[test]
    fn parse_rejects_unquoted_value() {
        assert!(matches!(
            parse_alias_definition("alias ll=ls"),
            Err(ShellError::InvalidAlias(_))
        ));
    }

    #[test]
    fn parse_rejects_missing_equals() {
        assert!(parse_alias_definition("alias ll").is_err());
        assert!(parse_alias_definition("alias a b='x'").is_err());
    }

    #[test]
    fn parse_rejects_unterminated_value() {
        assert!(parse_alias_definition("alias ll='ls -l").is_err());
    }
}
