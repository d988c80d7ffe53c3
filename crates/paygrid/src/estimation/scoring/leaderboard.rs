use serde::{Deserialize, Serialize};
use std::io::Read;

/// One row of the training leaderboard (`models.csv`), best model first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub model: String,
    #[serde(default)]
    pub score_val: Option<f64>,
    #[serde(default)]
    pub eval_metric: Option<String>,
    #[serde(default)]
    pub fit_time: Option<f64>,
}

/// Parses a leaderboard export, ignoring columns it does not know about.
pub fn read_leaderboard<R: Read>(reader: R) -> Result<Vec<LeaderboardEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<LeaderboardEntry>()
        .filter(|row| !matches!(row, Ok(entry) if entry.model.is_empty()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_known_columns_and_skips_the_rest() {
        let csv = "model,score_test,score_val,eval_metric,pred_time_val,fit_time\n\
                   WeightedEnsemble_L2,,-15234.2,root_mean_squared_error,0.31,12.5\n\
                   LightGBM, ,-15890.0,root_mean_squared_error,0.05,\n";

        let entries = read_leaderboard(Cursor::new(csv)).expect("leaderboard parses");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].model, "WeightedEnsemble_L2");
        assert_eq!(entries[0].score_val, Some(-15234.2));
        assert_eq!(entries[1].fit_time, None);
        assert_eq!(
            entries[1].eval_metric.as_deref(),
            Some("root_mean_squared_error")
        );
    }

    #[test]
    fn rejects_rows_without_a_model_column() {
        let csv = "name,score_val\nLightGBM,-1.0\n";
        assert!(read_leaderboard(Cursor::new(csv)).is_err());
    }
}
