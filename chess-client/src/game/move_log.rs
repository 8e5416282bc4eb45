//! 走子记录

use std::fmt;

/// 一个回合：白方一步，黑方可能尚未走
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveLogRow {
    /// 回合序号，从 1 开始
    pub number: usize,
    pub white: String,
    pub black: Option<String>,
}

impl fmt::Display for MoveLogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lance {}. {}", self.number, self.white)?;
        if let Some(black) = &self.black {
            write!(f, " {black}")?;
        }
        Ok(())
    }
}

/// 按回合分组服务端给出的走子历史
pub fn move_log_rows(history: &[String]) -> Vec<MoveLogRow> {
    history
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| MoveLogRow {
            number: index + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_empty_history() {
        assert!(move_log_rows(&[]).is_empty());
    }

    #[test]
    fn test_rows_pair_moves() {
        let rows = move_log_rows(&history(&["e4", "e5", "Nf3"]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_string(), "Lance 1. e4 e5");
        assert_eq!(rows[1].to_string(), "Lance 2. Nf3");
        assert_eq!(rows[1].black, None);
    }

    #[test]
    fn test_full_rounds() {
        let rows = move_log_rows(&history(&["d4", "d5", "c4", "dxc4"]));
        assert_eq!(rows[1], MoveLogRow {
            number: 2,
            white: "c4".to_string(),
            black: Some("dxc4".to_string()),
        });
    }
}
