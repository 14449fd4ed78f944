use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::default_until;

/// 一次扫描的过滤参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanFilter {
    /// 起始日期（包含）
    pub since: Option<NaiveDate>,

    /// 截止日期（不包含），缺省为明天
    pub until: Option<NaiveDate>,

    /// 交给 git `--author` 的作者模式
    pub author: Option<String>,

    /// 解析后再过滤的作者关键字，逗号分隔，任一匹配即可（不区分大小写）
    pub author_contains: Option<String>,
}

/// 截止日期已经归一化后的过滤参数
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub since: Option<NaiveDate>,
    pub until: NaiveDate,
    /// 截止日期是否由调用方显式给出
    pub until_explicit: bool,
    pub author: Option<String>,
    pub author_terms: AuthorFilter,
}

/// 作者关键字过滤器（OR 语义）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorFilter {
    terms: Vec<String>,
}

impl ScanFilter {
    /// 归一化过滤参数：去掉空白字符串，补全截止日期
    pub fn resolve(&self, today: NaiveDate) -> ResolvedFilter {
        ResolvedFilter {
            since: self.since,
            until: self.until.unwrap_or_else(|| default_until(today)),
            until_explicit: self.until.is_some(),
            author: non_blank(self.author.as_deref()),
            author_terms: AuthorFilter::parse(self.author_contains.as_deref().unwrap_or("")),
        }
    }
}

impl ResolvedFilter {
    /// 是否有需要 git 参与判断的过滤条件（决定是否进行预过滤）
    pub fn has_history_constraints(&self) -> bool {
        self.since.is_some() || self.until_explicit || self.author.is_some()
    }
}

impl AuthorFilter {
    /// 解析逗号分隔的关键字列表，空项被忽略
    pub fn parse(raw: &str) -> Self {
        let terms = raw
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();

        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// 作者名包含任一关键字即匹配；没有关键字时全部匹配
    pub fn matches(&self, author: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let author = author.to_lowercase();
        self.terms.iter().any(|term| author.contains(term.as_str()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
