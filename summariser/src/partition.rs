use polars::prelude::{col, lit, DataFrame, IntoLazy};
use std::collections::{BTreeMap, BTreeSet};

/// Partition the [`DataFrame`] by the values of a text column.
///
/// Returns the sub-DataFrame for each distinct value as a [`BTreeMap`] keyed by that value, so the
/// partitions come out in a stable order. Rows with no value in the column are left out.
pub fn partition_by_tag(
    data_frame: DataFrame,
    tag: &str,
) -> anyhow::Result<BTreeMap<String, DataFrame>> {
    let values = data_frame
        .column(tag)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect::<BTreeSet<_>>();

    let mut partitioned = BTreeMap::new();
    for value in values {
        log::debug!("Partition for {}={}", tag, value);

        let filtered = data_frame
            .clone()
            .lazy()
            .filter(col(tag).eq(lit(value.clone())))
            .collect()?;

        partitioned.insert(value, filtered);
    }

    Ok(partitioned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    fn create_test_dataframe() -> DataFrame {
        df! [
            "object" => ["Device", "Device", "Thread Network", "Power Meter", "Device"],
            "value"  => [1.,  2.,  3.,  4.,  5.],
            "numeric" => [6, 5, 4, 3, 2],
        ]
        .unwrap()
    }

    #[test]
    fn test_partition_by_object() -> anyhow::Result<()> {
        let partitioned = partition_by_tag(create_test_dataframe(), "object")?;

        assert_eq!(
            partitioned.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Device", "Power Meter", "Thread Network"]
        );
        assert_eq!(partitioned["Device"].height(), 3);
        assert_eq!(partitioned["Power Meter"].height(), 1);

        let values: Vec<f64> = partitioned["Device"]
            .column("value")?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(values, vec![1., 2., 5.]);

        Ok(())
    }

    #[test]
    fn test_partition_with_nonexistent_tag() {
        let result = partition_by_tag(create_test_dataframe(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_partition_with_numerical_tag() {
        // Only text columns can be used to partition
        let result = partition_by_tag(create_test_dataframe(), "numeric");
        assert!(result.is_err());
    }

    #[test]
    fn test_partition_empty_frame() -> anyhow::Result<()> {
        let frame = create_test_dataframe().head(Some(0));
        assert!(partition_by_tag(frame, "object")?.is_empty());
        Ok(())
    }
}
