//! Hebrew lemmatization of plain text, one stream per line.
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use clap::{App, AppSettings, Arg, ArgMatches};
use log::{debug, LevelFilter};
use lru_cache::LruCache;
use stdinout::OrExit;

use heb_lemmas::analysis::{LemmaFilter, StopwordFilter, TokenStream, WhitespaceTokenizer};
use heb_lemmas::{Config, Lemmatize, Lemmatizer, RemoteLemmatizer};

static DEFAULT_CLAP_SETTINGS: &[AppSettings] = &[
    AppSettings::DontCollapseArgsInUsage,
    AppSettings::UnifiedHelpMessage,
];

fn main() {
    let parsed = args();
    init_logging();

    let mut config = match parsed.value_of("CONFIG") {
        Some(path) => Config::read(path).or_exit("Reading the config failed", 1),
        None => Config::from_env().or_exit("Reading the config failed", 1),
    };
    if let Some(model_dir) = parsed.value_of("MODEL") {
        config.model_dir = model_dir.into();
    }

    let input = stdinout::Input::from(parsed.value_of("INPUT"));
    let reader = input.buf_read().or_exit("Cannot open input file", 1);
    let output = stdinout::Output::from(parsed.value_of("OUTPUT"));
    let writer = output.write().or_exit("Couldn't open output", 1);

    let cache_size = parse_usize_arg(&parsed, "CACHE_SIZE");
    let stopwords = parsed.is_present("STOPWORDS");
    let verbose = match output {
        stdinout::Output::File(_) => parsed.is_present("VERBOSE"),
        _ => false,
    };

    if parsed.is_present("REMOTE") {
        let url = parsed
            .value_of("URL")
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| config.remote_url());
        debug!("Using lemma service at {}", url);
        let lemmatizer = RemoteLemmatizer::new(url).or_exit("Cannot set up the HTTP client", 1);
        Processor::new(lemmatizer, writer, cache_size, stopwords).run(reader, verbose);
    } else {
        let lemmatizer =
            Lemmatizer::from_config(&config).or_exit("Cannot load the lemmatizer", 1);
        Processor::new(lemmatizer, writer, cache_size, stopwords).run(reader, verbose);
    }
}

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if heb_lemmas::debug_enabled() {
        builder
            .filter_module("heb_lemmas", LevelFilter::Debug)
            .filter_module("heb_lemmatize", LevelFilter::Debug);
    }
    builder.init();
}

// Struct to pass on metrics of a processed line.
#[derive(Debug, Default)]
struct Stats {
    lines: usize,
    tokens: usize,
    cache_hits: usize,
}

// Runs every line through the analysis chain and writes the lemmas.
struct Processor<L, W>
where
    L: Lemmatize,
    W: Write,
{
    filter: LemmaFilter<WhitespaceTokenizer, L>,
    writer: W,
    cache: LruCache<String, String>,
    stopwords: bool,
    stats: Stats,
}

impl<L, W> Processor<L, W>
where
    L: Lemmatize,
    W: Write,
{
    fn new(lemmatizer: L, writer: W, cache_size: usize, stopwords: bool) -> Self {
        Processor {
            filter: LemmaFilter::new(WhitespaceTokenizer::default(), lemmatizer),
            writer,
            cache: LruCache::new(cache_size),
            stopwords,
            stats: Stats::default(),
        }
    }

    fn run<R: BufRead>(mut self, reader: R, verbose: bool) {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
                .or_exit("Invalid progress bar template", 1),
        );
        if verbose {
            pb.enable_steady_tick(Duration::from_millis(200));
        }

        let time = Instant::now();
        for line in reader.lines() {
            let line = line.or_exit("Failed reading line!", 1);
            let lemmas = self.process_line(line);
            writeln!(self.writer, "{}", lemmas).or_exit("Writing to the output failed!", 1);

            if verbose && self.stats.tokens > 0 {
                pb.set_message(format!(
                    "Lines: {} ::: tokens: {} ::: cache hits: {} ::: avg. time/token: {:?}",
                    self.stats.lines,
                    self.stats.tokens,
                    self.stats.cache_hits,
                    time.elapsed() / self.stats.tokens as u32,
                ));
            }
        }

        self.writer.flush().or_exit("Writing to the output failed!", 1);
        pb.finish_and_clear();
        debug!("{:?} in {:?}", self.stats, time.elapsed());
    }

    // Lemmatizes one line, returning the space-joined lemmas.
    fn process_line(&mut self, line: String) -> String {
        self.stats.lines += 1;
        if let Some(lemmas) = self.cache.get_mut(&line) {
            self.stats.cache_hits += 1;
            return lemmas.clone();
        }

        self.filter.get_mut().set_text(line.as_str());
        self.filter.reset();

        let mut lemmas = Vec::new();
        {
            let mut sink = |token: &heb_lemmas::analysis::Token| lemmas.push(token.text.clone());
            if self.stopwords {
                StopwordFilter::new(&mut self.filter).process(&mut sink);
            } else {
                self.filter.process(&mut sink);
            }
        }
        self.stats.tokens += lemmas.len();

        let lemmas = lemmas.join(" ");
        self.cache.insert(line, lemmas.clone());
        lemmas
    }
}

fn parse_usize_arg(args: &ArgMatches, name: &str) -> usize {
    args.value_of(name)
        .unwrap_or_default()
        .parse::<usize>()
        .or_exit(format!("{} not a positive integer!", name), 1)
}

fn args() -> ArgMatches<'static> {
    App::new("heb-lemmatize")
        .settings(DEFAULT_CLAP_SETTINGS)
        .arg(
            Arg::with_name("MODEL")
                .help("Model directory.")
                .long_help(
                    "Directory holding model.onnx and tokenizer.json. The files are copied \
                     to the cache directory before first use. Overrides model_dir of the \
                     configuration.",
                )
                .index(1)
                .required(false),
        )
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .help("Config in toml format.")
                .long_help(
                    "Lemmatizer configuration. Defaults to the file named by \
                     KORRA_HEB_CONFIG or built-in defaults.",
                )
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Input file. If not provided input reads from stdin.")
                .long("input")
                .long_help(
                    "Plain text, one stream per line. Tokens are separated by whitespace. \
                     If no input file is provided the input is read from stdin.",
                )
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Output File. If not provided output writes to stdout.")
                .long("output")
                .short("o")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("REMOTE")
                .help("Use the remote lemma service instead of a local model.")
                .long("remote")
                .required(false),
        )
        .arg(
            Arg::with_name("URL")
                .help("Address of the lemma service.")
                .long_help(
                    "Defaults to the url of the configuration, KORRA_HEB_URL or \
                     http://dicta:8000/lemmas.",
                )
                .long("url")
                .takes_value(true)
                .requires("REMOTE")
                .required(false),
        )
        .arg(
            Arg::with_name("STOPWORDS")
                .help("Drop Hebrew stopwords from the output.")
                .long("stopwords")
                .short("s")
                .required(false),
        )
        .arg(
            Arg::with_name("CACHE_SIZE")
                .help("Cache size.")
                .short("c")
                .long("cache_size")
                .long_help(
                    "Defines the size of the LRU-cache of lemmatized lines. Size of 0 \
                     deactivates the cache.",
                )
                .takes_value(true)
                .required(false)
                .default_value("10000"),
        )
        .arg(
            Arg::with_name("VERBOSE")
                .help("Prints run metrics. Only available if '-o' is specified.")
                .long("verbose")
                .long_help(
                    "Prints throughput measures and elapsed time to stderr. Can only be used \
                     if an output file is specified using '-o'.",
                )
                .short("v")
                .requires("OUTPUT")
                .required(false),
        )
        .get_matches()
}
