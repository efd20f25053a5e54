use crate::settings::{Command, Settings};
use mappero_lib::codec::{self, GpxWriteOptions};
use mappero_lib::router::{
    self, DirectRouter, GoogleRouter, ReqwestTransport, RouterRegistry, TransportError,
    YandexRouter,
};
use mappero_lib::{
    FileStore, Format, GeoPoint, Location, MemoryStore, OptionStore, ParseError, PathData,
    ProjectionHandle, RouterError, RouterQuery, StorageError, WriteError,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to write GPX: {0}")]
    Write(#[from] WriteError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("routing failed: {0}")]
    Router(#[from] RouterError),

    #[error("option store: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client: {0}")]
    Transport(#[from] TransportError),

    #[error("unknown router {name:?} (available: {available})")]
    UnknownRouter { name: String, available: String },

    #[error("{0}")]
    Usage(String),
}

pub async fn execute(settings: &Settings) -> Result<(), CliError> {
    match &settings.command {
        Command::Info { files } => info(files),
        Command::Convert {
            input,
            output,
            legacy_segments,
        } => convert(input, output, *legacy_segments),
        Command::Route {
            router,
            from,
            to,
            depart,
            output,
        } => route(settings, router, from, to, *depart, output.as_deref()).await,
        Command::Options {
            router,
            assignments,
        } => options(settings, router.as_deref(), assignments),
    }
}

fn info(files: &[PathBuf]) -> Result<(), CliError> {
    let results = codec::import_files(files);
    let mut failures = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(data) => println!("{}: {}", path.display(), summary(&data)),
            Err(e) => {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %e, "Failed to read track");
            }
        }
    }

    if failures == files.len() {
        return Err(CliError::Usage("none of the files could be read".into()));
    }
    Ok(())
}

fn summary(data: &PathData) -> String {
    let mut text = format!(
        "{} points, {} segments, {} waypoints, {:.2} km",
        data.len(),
        data.segment_count(),
        data.waypoints().len(),
        data.length() / 1000.0
    );
    if let Some(rect) = data.bounding_box() {
        let (min, max) = (rect.min(), rect.max());
        text.push_str(&format!(
            ", bounds {:.5},{:.5} .. {:.5},{:.5}",
            min.y, min.x, max.y, max.x
        ));
    }
    text
}

fn convert(input: &Path, output: &Path, legacy_segments: bool) -> Result<(), CliError> {
    if Format::from_extension(output) != Some(Format::Gpx) {
        return Err(CliError::Usage(format!(
            "{}: only .gpx output is supported",
            output.display()
        )));
    }

    let data = codec::load_file(input).map_err(|source| CliError::Parse {
        path: input.to_path_buf(),
        source,
    })?;
    write_gpx(Some(output), &data, legacy_segments)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        points = data.len(),
        "Converted"
    );
    Ok(())
}

fn write_gpx(
    output: Option<&Path>,
    data: &PathData,
    legacy_segments: bool,
) -> Result<(), CliError> {
    let options = GpxWriteOptions {
        skip_segment_anchor: legacy_segments,
    };
    match output {
        Some(path) => {
            let mut sink = BufWriter::new(File::create(path)?);
            codec::save_gpx(&mut sink, data, options)?;
            sink.flush()?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            codec::save_gpx(&mut stdout, data, options)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

async fn route(
    settings: &Settings,
    router_name: &str,
    from: &str,
    to: &str,
    depart: Option<u32>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let projection = ProjectionHandle::default();
    let store = open_store(settings)?;
    let mut registry = build_registry(settings, &projection)?;
    registry.load_options(&store)?;

    let router = lookup(&registry, router_name)?;
    let mut query = RouterQuery::new(
        parse_location(from, &projection),
        parse_location(to, &projection),
    );
    if let Some(time) = depart {
        query = query.departing_at(time);
    }

    let path = router::calculate(router, query).await?;
    tracing::info!(
        router = router.name(),
        points = path.len(),
        length_m = path.length(),
        "Route calculated"
    );
    write_gpx(output, &path, false)
}

fn options(
    settings: &Settings,
    router_name: Option<&str>,
    assignments: &[String],
) -> Result<(), CliError> {
    let store = open_store(settings)?;
    let projection = ProjectionHandle::default();
    let mut registry = build_registry(settings, &projection)?;
    let prefix = match router_name {
        Some(name) => Some(format!("routers/{}/", lookup(&registry, name)?.name().to_lowercase())),
        None => None,
    };

    if !assignments.is_empty() {
        let updates = assignments
            .iter()
            .map(|assignment| parse_assignment(assignment, prefix.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        // Validate on a scratch copy before touching the file
        let staged = MemoryStore::new();
        for key in store.keys()? {
            if let Some(value) = store.get_string(&key)? {
                staged.set_string(&key, &value)?;
            }
        }
        for (key, value) in &updates {
            staged.set_string(key, value)?;
        }
        registry.load_options(&staged)?;

        for (key, value) in &updates {
            store.set_string(key, value)?;
            tracing::info!(key, value, "Option saved");
        }
    }

    let mut keys = store.keys()?;
    keys.sort();
    for key in keys {
        if prefix.as_deref().is_some_and(|prefix| !key.starts_with(prefix)) {
            continue;
        }
        if let Some(value) = store.get_string(&key)? {
            println!("{key}={value}");
        }
    }
    Ok(())
}

fn open_store(settings: &Settings) -> Result<FileStore, CliError> {
    let path = settings
        .options_file
        .clone()
        .unwrap_or_else(FileStore::default_path);
    tracing::debug!(path = %path.display(), "Opening option store");
    Ok(FileStore::open(path)?)
}

fn build_registry(
    settings: &Settings,
    projection: &ProjectionHandle,
) -> Result<RouterRegistry, CliError> {
    let transport = ReqwestTransport::new(Duration::from_secs(settings.timeout))?;

    let mut google = GoogleRouter::new(transport.clone(), projection.clone());
    if let Some(url) = &settings.google_url {
        google = google.with_base_url(url.as_str());
    }
    let mut yandex = YandexRouter::new(transport, projection.clone());
    if let Some(url) = &settings.yandex_url {
        yandex = yandex.with_base_url(url.as_str());
    }

    let mut registry = RouterRegistry::new();
    registry.register(Box::new(DirectRouter::new(projection.clone())));
    registry.register(Box::new(google));
    registry.register(Box::new(yandex));
    Ok(registry)
}

fn lookup<'a>(
    registry: &'a RouterRegistry,
    name: &str,
) -> Result<&'a dyn mappero_lib::Router, CliError> {
    registry.get(name).ok_or_else(|| CliError::UnknownRouter {
        name: name.to_string(),
        available: registry.names().join(", "),
    })
}

/// Split `key=value`, qualifying bare keys with the router prefix.
fn parse_assignment(assignment: &str, prefix: Option<&str>) -> Result<(String, String), CliError> {
    let (key, value) = assignment
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::Usage(format!("expected KEY=VALUE, got {assignment:?}")))?;
    let key = key.trim();
    let key = match prefix {
        Some(prefix) if !key.contains('/') => format!("{prefix}{key}"),
        _ => key.to_string(),
    };
    Ok((key, value.trim().to_string()))
}

/// `lat,lon` becomes a point, anything else is sent as an address.
pub fn parse_location(text: &str, projection: &ProjectionHandle) -> Location {
    let mut parts = text.split(',').map(str::trim);
    if let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next())
        && let (Ok(lat), Ok(lon)) = (lat.parse::<f64>(), lon.parse::<f64>())
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
    {
        return Location::from_geo(GeoPoint::new(lat, lon), projection.current().as_ref());
    }
    Location::from_address(text.trim())
}
