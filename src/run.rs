use anyhow::{anyhow, bail};
use argh::FromArgs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::builder::{Builder, Outcome};
use crate::canon::{canon_path, is_rooted};
use crate::emit::Emit;
use crate::fs::{FileSystem, RealFileSystem};
use crate::load::Loader;
use crate::persist::Writer;
use crate::snapshot::Content;
use crate::task::ImportContext;
use crate::{signal, trace};

/// lazyb: incrementally transform a source tree into an output tree.
#[derive(FromArgs)]
struct Args {
    /// chdir before running
    #[argh(option, short = 'C')]
    chdir: Option<String>,

    /// output directory [default=out]
    #[argh(option, short = 'o', default = "String::from(\"out\")")]
    out: String,

    /// source-relative path of a banner to prepend to every other file
    #[argh(option, short = 'b')]
    banner: Option<String>,

    /// keep running, rescanning the source tree every MILLIS milliseconds
    #[argh(option, short = 'w')]
    watch: Option<u64>,

    /// debugging tools, "-d list" to list
    #[argh(option, short = 'd')]
    debug: Option<String>,

    /// source directory [default=src]
    #[argh(positional)]
    src: Option<String>,
}

/// The built-in transform: with a banner configured, the banner file itself
/// produces nothing and every other file is emitted with the banner
/// prepended as a comment.  Without one, files are copied through.
pub struct Banner {
    path: Option<String>,
}

impl Banner {
    pub fn new(path: Option<&str>) -> anyhow::Result<Self> {
        let path = match path {
            None => None,
            Some(p) if is_rooted(p) => bail!("banner {:?} must be relative to the source", p),
            Some(p) => Some(canon_path(p)),
        };
        Ok(Banner { path })
    }

    pub fn transform(
        &self,
        cx: &ImportContext<'_>,
        path: &str,
        content: &Content,
    ) -> anyhow::Result<Emit> {
        let banner_path = match &self.path {
            None => return Ok(content.clone().into()),
            Some(p) => p,
        };
        if path == banner_path {
            return Ok(Emit::Nothing);
        }
        let banner = cx
            .import_file(banner_path)
            .map(|c| c.to_string_lossy().trim_end().to_owned())
            .unwrap_or_default();
        let mut out = format!("/* {} */\n", banner).into_bytes();
        out.extend_from_slice(content.as_bytes());
        Ok(out.into())
    }
}

/// One source tree, built into one output tree, over repeated rounds.
pub struct Session {
    src: PathBuf,
    loader: Loader,
    builder: Builder,
    writer: Writer,
}

impl Session {
    pub fn new(src: impl Into<PathBuf>, out: impl Into<PathBuf>, builder: Builder) -> Self {
        Session {
            src: src.into(),
            loader: Loader::new(),
            builder,
            writer: Writer::new(out),
        }
    }

    /// Scan the source, build it and mirror the result into the output.
    ///
    /// If writing fails the builder has still moved on; the writer keeps its
    /// own record of the output tree, so the next round finishes the job.
    pub fn round(&mut self, fs: &dyn FileSystem) -> anyhow::Result<Outcome> {
        let input = trace::scope("scan", || self.loader.scan(fs, &self.src))?;
        let outcome = self.builder.build_outcome(input)?;
        trace::scope("write", || self.writer.apply(&outcome.output))?;
        Ok(outcome)
    }
}

fn report(outcome: &Outcome) {
    if outcome.rebuilt.is_empty() && outcome.deleted.is_empty() {
        // Special case: don't print numbers when no work done.
        println!("lazyb: no work to do");
    } else {
        println!(
            "lazyb: rebuilt {} files, deleted {}, now up to date",
            outcome.rebuilt.len(),
            outcome.deleted.len()
        );
    }
}

fn watch(session: &mut Session, fs: &dyn FileSystem, interval: Duration) {
    signal::register_sigint();
    let mut first = true;
    while !signal::interrupted() {
        match session.round(fs) {
            Ok(outcome) => {
                if first || !outcome.rebuilt.is_empty() || !outcome.deleted.is_empty() {
                    report(&outcome);
                }
                first = false;
            }
            // A failed build commits nothing, and the writer diffs against what
            // it has on disk, so whatever was left undone is retried next round.
            Err(err) => println!("lazyb: error: {}", err),
        }
        std::thread::sleep(interval);
    }
}

fn run_impl() -> anyhow::Result<i32> {
    let args: Args = argh::from_env();

    if let Some(debug) = &args.debug {
        match debug.as_str() {
            "list" => {
                println!("debug tools:");
                println!("  trace  generate json performance trace");
                return Ok(1);
            }
            "trace" => trace::open("trace.json")?,
            _ => bail!("unknown -d {:?}, use -d list to list", debug),
        }
    }

    if let Some(dir) = &args.chdir {
        let dir = Path::new(dir);
        std::env::set_current_dir(dir).map_err(|err| anyhow!("chdir {:?}: {}", dir, err))?;
    }

    let src = args.src.unwrap_or_else(|| "src".to_string());
    if Path::new(&src) == Path::new(&args.out) {
        bail!("source and output directory are both {:?}", src);
    }

    let banner = Banner::new(args.banner.as_deref())?;
    let builder = Builder::new(move |cx, path, content| banner.transform(cx, path, content));
    let mut session = Session::new(src, args.out, builder);
    let fs = RealFileSystem::new();

    match args.watch {
        None => report(&session.round(&fs)?),
        Some(millis) => watch(&mut session, &fs, Duration::from_millis(millis)),
    }
    Ok(0)
}

pub fn run() -> anyhow::Result<i32> {
    let res = run_impl();
    // Tracing is best-effort; a failed flush must not mask the build result.
    let _ = trace::close();
    res
}
