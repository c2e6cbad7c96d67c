use tracing::error;

use super::{ChartRequest, FeeCacheError, FeeStore};
use crate::{ProtocolId, SeriesPoint, Window};

/// Chart points for every day of `request.window`, ascending.
///
/// Each value is the mean of the day and the `smoothing` days before it. A
/// missing cell anywhere in the extended range is an error; nothing is
/// interpolated.
pub fn derive_series(
    store: &FeeStore,
    request: &ChartRequest,
) -> Result<Vec<SeriesPoint>, FeeCacheError> {
    let extended = request.fetch_window()?;
    let span = request.smoothing as usize + 1;

    let primary = smoothed(store, &request.primary, extended, span)?;
    let secondary = match &request.secondary {
        Some(id) => Some(smoothed(store, id, extended, span)?),
        None => None,
    };

    Ok(request
        .window
        .days()
        .zip(primary)
        .enumerate()
        .map(|(index, (day, primary))| SeriesPoint {
            timestamp: day.start_timestamp(),
            primary,
            secondary: secondary.as_ref().map_or(0.0, |values| values[index]),
        })
        .collect())
}

fn smoothed(
    store: &FeeStore,
    id: &ProtocolId,
    extended: Window,
    span: usize,
) -> Result<Vec<f64>, FeeCacheError> {
    let raw = extended
        .days()
        .map(|date| {
            store.get(id, date).ok_or_else(|| {
                error!(protocol = %id, %date, "fee cell missing during series derivation");
                FeeCacheError::MissingCell {
                    protocol: id.clone(),
                    date,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(raw
        .windows(span)
        .map(|days| days.iter().sum::<f64>() / span as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DateKey, FeeRecord};

    fn id(value: &str) -> ProtocolId {
        ProtocolId::parse(value).expect("valid id")
    }

    fn day(value: &str) -> DateKey {
        DateKey::parse(value).expect("valid day")
    }

    fn store_with(protocol: &str, start: &str, fees: &[f64]) -> FeeStore {
        let mut store = FeeStore::new();
        let first = day(start);
        store.merge(
            &id(protocol),
            fees.iter().enumerate().map(|(offset, fee)| {
                let date = first.offset_days(offset as i64).expect("in range");
                FeeRecord::new(date, *fee).expect("valid fee")
            }),
        );
        store
    }

    #[test]
    fn smoothing_averages_the_preceding_days() {
        let store = store_with("ethereum", "2020-09-01", &[10.0, 20.0, 30.0]);
        let request = ChartRequest::new(Window::single(day("2020-09-03")), id("ethereum"))
            .with_smoothing(2);

        let series = derive_series(&store, &request).expect("cells present");

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].primary, 20.0);
        assert_eq!(series[0].secondary, 0.0);
        assert_eq!(series[0].timestamp, day("2020-09-03").start_timestamp());
    }

    #[test]
    fn series_has_one_ascending_point_per_window_day() {
        let store = store_with("ethereum", "2020-09-01", &[1.0; 10]);
        let window = Window::new(day("2020-09-03"), day("2020-09-10")).expect("valid window");
        let request = ChartRequest::new(window, id("ethereum")).with_smoothing(1);

        let series = derive_series(&store, &request).expect("cells present");

        assert_eq!(series.len(), window.len());
        assert!(series.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[test]
    fn secondary_values_come_from_their_own_protocol() {
        let mut store = store_with("uniswap-v2", "2020-09-01", &[4.0, 8.0]);
        store.merge(
            &id("sushiswap"),
            [
                FeeRecord::new(day("2020-09-01"), 1.0).expect("valid"),
                FeeRecord::new(day("2020-09-02"), 3.0).expect("valid"),
            ],
        );
        let window = Window::new(day("2020-09-01"), day("2020-09-02")).expect("valid window");
        let request = ChartRequest::new(window, id("uniswap-v2")).with_secondary(id("sushiswap"));

        let series = derive_series(&store, &request).expect("cells present");

        assert_eq!(
            series.iter().map(|p| (p.primary, p.secondary)).collect::<Vec<_>>(),
            vec![(4.0, 1.0), (8.0, 3.0)]
        );
    }

    #[test]
    fn missing_cell_is_reported_not_interpolated() {
        let store = store_with("ethereum", "2020-09-02", &[5.0, 6.0]);
        let window = Window::new(day("2020-09-02"), day("2020-09-03")).expect("valid window");
        let request = ChartRequest::new(window, id("ethereum")).with_smoothing(1);

        let error = derive_series(&store, &request).expect_err("2020-09-01 is absent");

        assert_eq!(
            error,
            FeeCacheError::MissingCell {
                protocol: id("ethereum"),
                date: day("2020-09-01"),
            }
        );
    }
}
