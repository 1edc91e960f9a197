use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::Result;

/// 远程调用的参数与返回值
///
/// 每个参数在翻译阶段就确定类型，不依赖引号之类的书写约定推断：
/// 树名是 atom，DSN 与过滤条件是字符串，坐标是浮点数。
/// 线上使用带标签的 JSON 编码：`{"type": "float", "value": 10.0}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    Atom(String),
    String(String),
    Integer(i64),
    Float(f64),
    List(Vec<Term>),
    Tuple(Vec<Term>),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Term::String(text.into())
    }

    /// 浮点参数必须是有限值
    pub fn float(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(ClientError::Parse(format!(
                "float argument must be finite, got {}",
                value
            )));
        }
        Ok(Term::Float(value))
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Term::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn is_bare_atom(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
        }
        _ => false,
    }
}

/// 按 Erlang 的转义规则输出带引号的文本
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str, quote: char) -> fmt::Result {
    f.write_char(quote)?;
    for c in text.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{0b}' => f.write_str("\\v")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0c}' => f.write_str("\\f")?,
            '\u{1b}' => f.write_str("\\e")?,
            '\u{7f}' => f.write_str("\\d")?,
            // 其余控制字符写成 \^X
            c if (c as u32) < 0x20 => {
                f.write_str("\\^")?;
                f.write_char(char::from(c as u8 + 0x40))?;
            }
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

/// 浮点数总带小数部分：`1.0e20` 而不是 `1e20`
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            write!(f, "{}.0e{}", mantissa, exponent)
        }
        _ => f.write_str(&repr),
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// 按 Erlang 项的书写形式输出
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) if is_bare_atom(name) => f.write_str(name),
            Term::Atom(name) => write_quoted(f, name, '\''),
            Term::String(text) => write_quoted(f, text, '"'),
            Term::Integer(n) => write!(f, "{}", n),
            Term::Float(v) => write_float(f, *v),
            Term::List(items) => {
                f.write_str("[")?;
                write_seq(f, items)?;
                f.write_str("]")
            }
            Term::Tuple(items) => {
                f.write_str("{")?;
                write_seq(f, items)?;
                f.write_str("}")
            }
        }
    }
}
