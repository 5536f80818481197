//! Writes a deterministic reading log for trying the dashboard:
//! `book_stats.csv`, `book_stats.parquet` and `daily_pages.csv`.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const BOOKS: [(&str, &str); 24] = [
    ("Dune", "Frank Herbert"),
    ("Neuromancer", "William Gibson"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin"),
    ("Middlemarch", "George Eliot"),
    ("Emma", "Jane Austen"),
    ("Persuasion", "Jane Austen"),
    ("The Name of the Wind", "Patrick Rothfuss"),
    ("A Wizard of Earthsea", "Ursula K. Le Guin"),
    ("Hyperion", "Dan Simmons"),
    ("The Remains of the Day", "Kazuo Ishiguro"),
    ("Never Let Me Go", "Kazuo Ishiguro"),
    ("Piranesi", "Susanna Clarke"),
    ("Jonathan Strange & Mr Norrell", "Susanna Clarke"),
    ("The Dispossessed", "Ursula K. Le Guin"),
    ("Station Eleven", "Emily St. John Mandel"),
    ("Sea of Tranquility", "Emily St. John Mandel"),
    ("Project Hail Mary", "Andy Weir"),
    ("The Martian", "Andy Weir"),
    ("Rebecca", "Daphne du Maurier"),
    ("Jane Eyre", "Charlotte Brontë"),
    ("Wuthering Heights", "Emily Brontë"),
    ("The Fifth Season", "N. K. Jemisin"),
    ("Mistborn", "Brandon Sanderson"),
    ("Circe", "Madeline Miller"),
];

const STATUSES: [&str; 4] = ["read", "read", "read", "to-read"];
const TAGS: [&str; 5] = ["sci-fi", "fantasy", "classic", "literary", "sci-fi, classic"];

struct BookRow {
    title: String,
    author: String,
    status: String,
    last_read: Option<NaiveDate>,
    read_count: i64,
    rating: Option<f64>,
    tags: String,
}

fn generate_books(rng: &mut SimpleRng, start: NaiveDate) -> Vec<BookRow> {
    BOOKS
        .iter()
        .map(|&(title, author)| {
            let status = rng.pick(&STATUSES).to_string();
            let read = status == "read";
            let last_read = read.then(|| start + Days::new(rng.below(730) as u64));
            let rating = (read && rng.next_f64() > 0.1)
                .then(|| ((2.0 + rng.next_f64() * 3.0) * 4.0).round() / 4.0);
            BookRow {
                title: title.to_string(),
                author: author.to_string(),
                status,
                last_read,
                read_count: if read { 1 + rng.below(3) as i64 } else { 0 },
                rating,
                tags: rng.pick(&TAGS).to_string(),
            }
        })
        .collect()
}

fn write_books_csv(path: &str, books: &[BookRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "Title",
        "Authors",
        "Contributors",
        "ISBN/UID",
        "Read Status",
        "Last Date Read",
        "Read Count",
        "Star Rating",
        "Tags",
    ])?;
    for b in books {
        let last_read = b
            .last_read
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_default();
        let rating = b.rating.map(|r| r.to_string()).unwrap_or_default();
        let read_count = b.read_count.to_string();
        writer.write_record([
            b.title.as_str(),
            b.author.as_str(),
            "",
            "",
            b.status.as_str(),
            last_read.as_str(),
            read_count.as_str(),
            rating.as_str(),
            b.tags.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_books_parquet(path: &str, books: &[BookRow]) -> Result<()> {
    let text = |f: fn(&BookRow) -> Option<String>| -> ArrayRef {
        Arc::new(StringArray::from(books.iter().map(f).collect::<Vec<_>>()))
    };
    let columns: Vec<ArrayRef> = vec![
        text(|b| Some(b.title.clone())),
        text(|b| Some(b.author.clone())),
        text(|b| Some(b.status.clone())),
        text(|b| b.last_read.map(|d| d.format("%Y-%m-%d").to_string())),
        Arc::new(Int64Array::from(
            books.iter().map(|b| b.read_count).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            books.iter().map(|b| b.rating).collect::<Vec<_>>(),
        )),
        text(|b| Some(b.tags.clone())),
    ];

    let schema = Arc::new(Schema::new(vec![
        Field::new("Title", DataType::Utf8, false),
        Field::new("Authors", DataType::Utf8, false),
        Field::new("Read Status", DataType::Utf8, false),
        Field::new("Last Date Read", DataType::Utf8, true),
        Field::new("Read Count", DataType::Int64, false),
        Field::new("Star Rating", DataType::Float64, true),
        Field::new("Tags", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_daily_pages(path: &str, rng: &mut SimpleRng, start: NaiveDate) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["Dates", "Pages"])?;
    let mut rows = 0;
    for day in start.iter_days().take(730) {
        // Roughly two reading days in three.
        if rng.below(3) == 0 {
            continue;
        }
        let pages = 5 + rng.below(80);
        writer.write_record([day.format("%Y-%m-%d").to_string(), pages.to_string()])?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).context("invalid start date")?;

    let books = generate_books(&mut rng, start);
    write_books_csv("book_stats.csv", &books)?;
    write_books_parquet("book_stats.parquet", &books)?;
    let days = write_daily_pages("daily_pages.csv", &mut rng, start)?;

    println!(
        "Wrote {} books to book_stats.csv / book_stats.parquet and {days} reading days to daily_pages.csv",
        books.len()
    );
    Ok(())
}
