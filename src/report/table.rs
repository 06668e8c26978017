use std::fmt;

use super::ResultRow;

/// Plain-text results table with the advice list underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub advice: Vec<String>,
}

impl ResultsTable {
    pub fn from_rows(rows: &[ResultRow], advice: &[String]) -> Self {
        let columns: &[&str] = match rows.first() {
            Some(ResultRow::Phase(_)) => &[
                "Phase",
                "Stars",
                "Right Angle (°)",
                "Left Angle (°)",
                "Right Range",
                "Left Range",
            ],
            Some(ResultRow::Cloud(_)) => &["Cloud", "Attempts", "Stability (%)"],
            Some(ResultRow::Obstacle(_)) => &["Obstacle", "Passed", "Min Knee Angle (°)"],
            None => &[],
        };

        let cells = rows
            .iter()
            .map(|row| match row {
                ResultRow::Phase(r) => vec![
                    r.phase.as_str().to_string(),
                    r.stars.to_string(),
                    format!("{:.1}", r.right_angle),
                    format!("{:.1}", r.left_angle),
                    format!("{:.3}", r.right_range),
                    format!("{:.3}", r.left_range),
                ],
                ResultRow::Cloud(r) => vec![
                    r.cloud.to_string(),
                    r.attempts.to_string(),
                    r.stability.to_string(),
                ],
                ResultRow::Obstacle(r) => vec![
                    r.obstacle.to_string(),
                    if r.passed { "✅" } else { "❌" }.to_string(),
                    format!("{:.1}", r.min_knee_angle),
                ],
            })
            .collect();

        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: cells,
            advice: advice.to_vec(),
        }
    }
}

impl fmt::Display for ResultsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            writeln!(f, "No data available.")?;
        } else {
            let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
            for row in &self.rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            write_line(f, &self.columns, &widths)?;
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            writeln!(f, "|-{}-|", rule.join("-|-"))?;
            for row in &self.rows {
                write_line(f, row, &widths)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Advice")?;
        for item in &self.advice {
            writeln!(f, "  - {item}")?;
        }
        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    writeln!(f, "| {} |", padded.join(" | "))
}
