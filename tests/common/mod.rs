//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vigilar::data::{Column, FeatureFrame, MemoryDataset};

/// Box-Muller normal sample
pub fn normal(n: usize, mean: f64, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.random_range(f64::EPSILON..1.0);
            let u2: f64 = rng.random();
            mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

pub fn end_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 28, 16, 0, 0).unwrap()
}

/// Frame with `ticker`, hourly `date` ending at [`end_time`], and `rsi_14`
pub fn hourly_frame(rows: &[(&str, Vec<f64>)]) -> FeatureFrame {
    let mut tickers = Vec::new();
    let mut dates = Vec::new();
    let mut values = Vec::new();
    for (entity, series) in rows {
        let n = series.len() as i64;
        for (i, v) in series.iter().enumerate() {
            tickers.push(Some(entity.to_string()));
            dates.push(Some(end_time() - Duration::hours(n - 1 - i as i64)));
            values.push(*v);
        }
    }
    FeatureFrame::from_columns([
        ("ticker", Column::Text(tickers)),
        ("date", Column::Timestamp(dates)),
        ("rsi_14", Column::Numeric(values)),
    ])
    .unwrap()
}

/// AAPL: N(0,1) x 2000 vs N(1,1.2) x 500. MSFT: identical windows.
pub fn drift_scenario() -> (MemoryDataset, MemoryDataset) {
    let stable = normal(400, 50.0, 5.0, 9);
    let baseline = hourly_frame(&[("AAPL", normal(2000, 0.0, 1.0, 1)), ("MSFT", stable.clone())]);
    let current = hourly_frame(&[("AAPL", normal(500, 1.0, 1.2, 2)), ("MSFT", stable)]);
    (MemoryDataset::new(baseline), MemoryDataset::new(current))
}

/// Write a daily Parquet dataset: one row per (entity, day), last day 2024-06-28
pub fn write_daily_parquet(path: &std::path::Path, rows: &[(&str, Vec<f64>)]) {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let last = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
    let last_day = (last - epoch).num_days() as i32;

    let mut tickers = Vec::new();
    let mut days = Vec::new();
    let mut values = Vec::new();
    for (entity, series) in rows {
        let n = series.len() as i32;
        for (i, v) in series.iter().enumerate() {
            tickers.push(entity.to_string());
            days.push(last_day - (n - 1 - i as i32));
            values.push(*v);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("ticker", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new("rsi_14", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(tickers)),
            Arc::new(Date32Array::from(days)),
            Arc::new(Float64Array::from(values)),
        ],
    )
    .unwrap();

    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// A request captured by [`serve`]
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: String,
}

/// Serve one canned `(status, body)` response per connection, then stop.
pub fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut captured = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                head.push_str(&line);
            }
            let mut buf = vec![0u8; content_length];
            reader.read_exact(&mut buf).unwrap();
            let body_text = String::from_utf8_lossy(&buf).into_owned();
            captured.push(Captured { head, body: body_text });

            let response = format!(
                "HTTP/1.1 {status} Status\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        captured
    });
    (url, handle)
}
