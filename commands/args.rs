use geo::Point;

use crate::error::ClientError;
use crate::protocol::Term;
use crate::Result;

/// 参数解析工具
pub struct ArgumentParser {
    command_name: &'static str,
}

impl ArgumentParser {
    pub fn new(command_name: &'static str) -> Self {
        Self { command_name }
    }

    /// 树名以 atom 形式发送
    pub fn tree_name(&self, raw: &str) -> Result<Term> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ClientError::Parse(format!(
                "missing tree name for '{}' command",
                self.command_name
            )));
        }
        Ok(Term::atom(name))
    }

    /// 解析 `X,Y`（经度,纬度）形式的点，有限性由 `Term::float` 检查
    pub fn point(&self, raw: &str) -> Result<Point<f64>> {
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() != 2 {
            return Err(ClientError::Parse(format!(
                "invalid point '{}' for '{}' command: expected X,Y",
                raw, self.command_name
            )));
        }

        let x = self.coordinate(raw, fields[0])?;
        let y = self.coordinate(raw, fields[1])?;
        Ok(Point::new(x, y))
    }

    fn coordinate(&self, raw: &str, field: &str) -> Result<f64> {
        field.trim().parse::<f64>().map_err(|e| {
            ClientError::Parse(format!(
                "invalid coordinate '{}' in point '{}': {}",
                field.trim(),
                raw,
                e
            ))
        })
    }
}
