//! Count command

use anyhow::{bail, Result};
use assetsync_storage::{CustomerModel, CustomerStorage, DatabaseUrl};

pub async fn execute(database_url: &str, list: Option<i64>) -> Result<()> {
    if let Some(limit) = list {
        if !(1..=1000).contains(&limit) {
            bail!("--list must be between 1 and 1000, got {}", limit);
        }
    }

    let url = DatabaseUrl::parse(database_url)?;
    let storage = CustomerStorage::connect(&url).await?;

    let result = async {
        let count = storage.count_customers().await?;
        let rows = match list {
            Some(limit) => storage.list_customers(limit, 0).await?,
            None => Vec::new(),
        };
        Ok::<_, assetsync_storage::Error>((count, rows))
    }
    .await;
    storage.close().await;
    let (count, rows) = result?;

    println!("Customers in database: {}", count);
    if !rows.is_empty() {
        println!();
        print!("{}", render_rows(&rows));
    }

    Ok(())
}

fn render_rows(rows: &[CustomerModel]) -> String {
    let width = rows
        .iter()
        .map(|r| r.object_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("OBJECT ID".len());

    let mut out = format!("{:<width$}  {:<20}  NAME\n", "OBJECT ID", "UPDATED", width = width);
    for row in rows {
        out.push_str(&format!(
            "{:<width$}  {:<20}  {}\n",
            row.object_id,
            row.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.name,
            width = width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_rows() {
        let updated = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let rows = vec![CustomerModel {
            object_id: "42".to_string(),
            name: "Acme".to_string(),
            object_key: None,
            created_at: updated,
            updated_at: updated,
        }];

        let out = render_rows(&rows);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "OBJECT ID  UPDATED               NAME");
        assert_eq!(lines[1], "42         2024-05-01 09:30:00   Acme");
    }

    #[tokio::test]
    async fn test_list_limit_is_checked_before_connecting() {
        let err = execute("postgresql://u:p@localhost:5432/db", Some(0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--list"));
    }
}
