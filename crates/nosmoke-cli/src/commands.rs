//! Subcommands and their output.

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone as _};
use clap::Subcommand;
use nosmoke_core::{
  cigarette::Cigarette,
  day::{LocalDay, now_millis},
  entry::{Collection, Entry, Index},
  record::{Record, RecordKind},
  store::LocalStore,
};
use serde::Serialize;

// ─── Commands ─────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Manage the cigarette catalog.
  #[command(subcommand)]
  Cigarette(CigaretteCommand),

  /// Log one cigarette.
  Smoke {
    cigarette_id: i64,
    /// Record it as given away rather than smoked.
    #[arg(long)]
    share:        bool,
    /// When it happened (RFC 3339); defaults to now.
    #[arg(long, value_name = "TIME")]
    at:           Option<DateTime<FixedOffset>>,
  },

  /// Inspect or remove logged records.
  #[command(subcommand)]
  Record(RecordCommand),

  /// Records logged today, with totals.
  Today,

  /// The most recent record and the time since.
  Latest,

  /// Records on the given local days, both included.
  Range {
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: NaiveDate,
    #[arg(long, value_name = "YYYY-MM-DD")]
    to:   NaiveDate,
  },
}

#[derive(Subcommand, Debug)]
pub enum CigaretteCommand {
  Add {
    #[arg(long)]
    name:      String,
    /// Price of one pack.
    #[arg(long)]
    price:     f64,
    #[arg(long, default_value_t = 20)]
    pack_size: u32,
  },
  List,
  Update {
    id:        i64,
    #[arg(long)]
    name:      Option<String>,
    #[arg(long)]
    price:     Option<f64>,
    #[arg(long)]
    pack_size: Option<u32>,
  },
  Remove {
    id: i64,
  },
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
  List {
    /// Only records of this cigarette.
    #[arg(long)]
    cigarette: Option<i64>,
    /// Only records of this kind (`smoke` or `share`).
    #[arg(long)]
    kind:      Option<RecordKind>,
  },
  Remove {
    id: i64,
  },
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Run `command` against `store`, printing results to stdout.
pub async fn run<S: LocalStore>(store: &S, command: Command, json: bool) -> Result<()> {
  let out = Output { json };

  match command {
    Command::Cigarette(cmd) => run_cigarette(store, cmd, out).await,

    Command::Smoke { cigarette_id, share, at } => {
      let kind = if share { RecordKind::Share } else { RecordKind::Smoke };
      let record = smoke(store, cigarette_id, kind, at).await?;
      out.one(&record, || format!("Logged {}", describe(&record)))
    }

    Command::Record(RecordCommand::List { cigarette, kind }) => {
      let records = list_records(store, cigarette, kind).await?;
      out.records(&records)
    }

    Command::Record(RecordCommand::Remove { id }) => {
      store.delete(Collection::Records, id).await?;
      out.done(format!("Removed record #{id}"))
    }

    Command::Today => {
      let records = store.get_today_records().await?;
      out.records(&records)?;
      if !out.json {
        println!("{}", Summary::of(&records));
      }
      Ok(())
    }

    Command::Latest => match store.get_latest_record().await? {
      Some(record) => out.one(&record, || {
        format!(
          "{} ({} ago)",
          describe(&record),
          fmt_elapsed(now_millis() - record.timestamp)
        )
      }),
      None => out.done("No records yet".to_owned()),
    },

    Command::Range { from, to } => {
      let records = records_on_days(store, from, to, &Local).await?;
      out.records(&records)?;
      if !out.json {
        println!("{}", Summary::of(&records));
      }
      Ok(())
    }
  }
}

async fn run_cigarette<S: LocalStore>(store: &S, cmd: CigaretteCommand, out: Output) -> Result<()> {
  match cmd {
    CigaretteCommand::Add { name, price, pack_size } => {
      let cigarette = Cigarette::new(name, price, pack_size, now_millis());
      let id = store.add(cigarette.clone().into()).await?;
      let cigarette = Cigarette { id: Some(id), ..cigarette };
      out.one(&cigarette, || format!("Added cigarette #{id} {}", cigarette.name))
    }

    CigaretteCommand::List => {
      let cigarettes: Vec<Cigarette> = store
        .get_all(Collection::Cigarettes)
        .await?
        .into_iter()
        .filter_map(Entry::into_cigarette)
        .collect();

      if out.json {
        return print_json(&cigarettes);
      }
      for c in &cigarettes {
        println!(
          "#{:<4} {:<24} {:>8.2} / {} per pack",
          c.id.unwrap_or_default(),
          c.name,
          c.price,
          c.pack_size
        );
      }
      Ok(())
    }

    CigaretteCommand::Update { id, name, price, pack_size } => {
      let cigarette = update_cigarette(store, id, name, price, pack_size).await?;
      out.one(&cigarette, || format!("Updated cigarette #{id}"))
    }

    CigaretteCommand::Remove { id } => {
      store.delete(Collection::Cigarettes, id).await?;
      out.done(format!("Removed cigarette #{id}"))
    }
  }
}

/// Log one unit of cigarette `cigarette_id`, at `at` or now.
async fn smoke<S: LocalStore>(
  store: &S,
  cigarette_id: i64,
  kind: RecordKind,
  at: Option<DateTime<FixedOffset>>,
) -> Result<Record> {
  let cigarette = find_cigarette(store, cigarette_id).await?;
  let now = now_millis();
  let timestamp = at.map_or(now, |t| t.timestamp_millis());

  let record = Record::for_cigarette(&cigarette, kind, timestamp, now)?;
  let id = store.add(record.clone().into()).await?;
  Ok(Record { id: Some(id), ..record })
}

/// Read, patch and write back a cigarette, refreshing `updated_at`.
async fn update_cigarette<S: LocalStore>(
  store: &S,
  id: i64,
  name: Option<String>,
  price: Option<f64>,
  pack_size: Option<u32>,
) -> Result<Cigarette> {
  let mut cigarette = find_cigarette(store, id).await?;
  if let Some(name) = name {
    cigarette.name = name;
  }
  if let Some(price) = price {
    cigarette.price = price;
  }
  if let Some(pack_size) = pack_size {
    cigarette.pack_size = pack_size;
  }
  cigarette.updated_at = now_millis();

  store.update(cigarette.clone().into()).await?;
  Ok(cigarette)
}

/// Records filtered by cigarette and kind. The cigarette index is used when
/// both are given and the kind is checked afterwards.
async fn list_records<S: LocalStore>(
  store: &S,
  cigarette: Option<i64>,
  kind: Option<RecordKind>,
) -> Result<Vec<Record>> {
  let entries = match (cigarette, kind) {
    (Some(id), _) => store.get_by_index(Index::RecordCigaretteId, id.into()).await?,
    (None, Some(kind)) => store.get_by_index(Index::RecordKind, kind.into()).await?,
    (None, None) => store.get_all(Collection::Records).await?,
  };

  Ok(
    entries
      .into_iter()
      .filter_map(Entry::into_record)
      .filter(|r| kind.is_none_or(|k| r.kind == k))
      .collect(),
  )
}

async fn records_on_days<S: LocalStore, Tz: chrono::TimeZone>(
  store: &S,
  from: NaiveDate,
  to: NaiveDate,
  tz: &Tz,
) -> Result<Vec<Record>> {
  let (start, end) = day_span(from, to, tz);
  Ok(store.get_records_by_date_range(start, end).await?)
}

async fn find_cigarette<S: LocalStore>(store: &S, id: i64) -> Result<Cigarette> {
  let entry = store
    .get(Collection::Cigarettes, id)
    .await
    .with_context(|| format!("looking up cigarette #{id}"))?;

  match entry.and_then(Entry::into_cigarette) {
    Some(c) => Ok(c),
    None => bail!("no cigarette with id {id}"),
  }
}

// ─── Output ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Output {
  json: bool,
}

impl Output {
  fn one<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if self.json {
      print_json(value)
    } else {
      println!("{}", text());
      Ok(())
    }
  }

  fn done(&self, message: String) -> Result<()> {
    println!("{}", self.status(message));
    Ok(())
  }

  /// JSON consumers get `null` for commands that return nothing.
  fn status(&self, message: String) -> String {
    if self.json { "null".to_owned() } else { message }
  }

  fn records(&self, records: &[Record]) -> Result<()> {
    if self.json {
      return print_json(&records);
    }
    for r in records {
      println!("{}", describe(r));
    }
    Ok(())
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value).context("serialising output")?);
  Ok(())
}

fn describe(r: &Record) -> String {
  let price = r.price.map(|p| format!(" {p:.2}")).unwrap_or_default();
  format!(
    "#{:<4} {} {:<5} {}{price}",
    r.id.unwrap_or_default(),
    fmt_time(r.timestamp),
    r.kind,
    r.cigarette_name
  )
}

fn fmt_time(millis: i64) -> String {
  match Local.timestamp_millis_opt(millis).single() {
    Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
    None => millis.to_string(),
  }
}

/// Render a millisecond duration as hours and minutes.
fn fmt_elapsed(millis: i64) -> String {
  let minutes = millis.max(0) / 60_000;
  match (minutes / 60, minutes % 60) {
    (0, m) => format!("{m} min"),
    (h, m) => format!("{h} h {m} min"),
  }
}

/// Inclusive millisecond span from the start of `from` to the end of `to`.
fn day_span<Tz: chrono::TimeZone>(from: NaiveDate, to: NaiveDate, tz: &Tz) -> (i64, i64) {
  (LocalDay::of(from, tz).start, LocalDay::of(to, tz).end)
}

/// Totals over a set of records.
#[derive(Debug, Default, PartialEq)]
struct Summary {
  smoked: usize,
  shared: usize,
  cost:   f64,
}

impl Summary {
  fn of(records: &[Record]) -> Self {
    records.iter().fold(Self::default(), |mut s, r| {
      match r.kind {
        RecordKind::Smoke => s.smoked += 1,
        RecordKind::Share => s.shared += 1,
      }
      s.cost += r.price.unwrap_or_default();
      s
    })
  }
}

impl std::fmt::Display for Summary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} smoked, {} shared, {:.2} spent",
      self.smoked, self.shared, self.cost
    )
  }
}
