//! CLI command handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::storefront::Storefront;
use crate::application::services::{MountOptions, UrlResolver};
use crate::application::use_cases::SeedCatalogUseCase;
use crate::domain::entities::{
    AspectRatio, DisplayIntent, ImageLoadState, ImageRequest, InstanceId, ObjectFit, Rect,
    UserIdentity,
};
use crate::infrastructure::catalog::InMemoryCatalog;
use crate::infrastructure::config::{AppConfig, Command, ImageArgs};
use crate::infrastructure::image::{AssetFetcher, AssetFetcherConfig};

/// Extra time granted to the event loop on top of the HTTP timeout.
const FETCH_GRACE: Duration = Duration::from_secs(5);

/// Runs one CLI command against the given configuration.
///
/// # Errors
/// Returns error if the arguments are invalid or output cannot be produced.
pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Resolve(image) => resolve(config, &image),
        Command::Render { image, fail } => render(config, &image, fail),
        Command::Fetch {
            image,
            display_width,
        } => fetch(config, &image, display_width).await,
        Command::Catalog {
            seed,
            columns,
            steps,
        } => catalog(config, &seed, columns, steps).await,
        Command::Access { email } => {
            access(config, &email);
            Ok(())
        }
    }
}

/// Builds an image request from command arguments.
///
/// # Errors
/// Returns error if the aspect ratio cannot be parsed.
pub fn image_request(args: &ImageArgs) -> Result<ImageRequest> {
    let aspect_ratio = args
        .aspect_ratio
        .as_deref()
        .map(|s| AspectRatio::parse(s).ok_or_else(|| eyre!("invalid aspect ratio: {s}")))
        .transpose()?;

    let intent = DisplayIntent {
        width: args.width,
        height: args.height,
        aspect_ratio,
        object_fit: ObjectFit::default(),
    };

    Ok(ImageRequest::new(args.path.clone())
        .with_priority(args.priority)
        .with_responsive(args.responsive)
        .with_blur_placeholder(args.blur)
        .with_intent(intent)
        .with_widths(args.widths.clone()))
}

fn resolve(config: &AppConfig, args: &ImageArgs) -> Result<()> {
    let request = image_request(args)?.with_blur_placeholder(true);
    let resolver = UrlResolver::new(config.resolver_settings());
    let urls = resolver.resolve(&request);
    println!("{}", serde_json::to_string_pretty(&urls)?);
    Ok(())
}

fn render(config: &AppConfig, args: &ImageArgs, fail: bool) -> Result<()> {
    let request = image_request(args)?;
    let priority = request.priority;
    let mut page = Storefront::new(config);
    let viewport = page.viewport();

    // Priority images sit at the top of the page, lazy ones two screens down.
    let top = if priority { 0.0 } else { viewport.height * 2.0 };
    let width = f64::from(args.width.unwrap_or(400));
    let height = f64::from(request.display_intent.effective_height().unwrap_or(300));
    let id = page.mount_at(
        request,
        MountOptions::default(),
        Rect::new(0.0, top, width, height),
    );

    print_step(&page, id, "mounted");
    if !page.head().is_empty() {
        println!("{}", page.head().to_html());
    }

    if page.pipeline().state(id) == Some(ImageLoadState::NotRequested) {
        let entered = page.scroll_by(viewport.height * 2.0);
        debug!(entered, "Scrolled to image");
        print_step(&page, id, "near viewport");
    }

    for request in page.drain_fetch_requests() {
        if fail {
            page.pipeline_mut()
                .on_error(request.instance, "simulated network failure");
        } else {
            page.pipeline_mut().on_load(request.instance);
        }
    }
    print_step(&page, id, if fail { "failed" } else { "loaded" });

    page.close();
    println!(
        "unmounted: {} observations, {} preload links",
        page.pipeline().active_observations(),
        page.head().len()
    );
    Ok(())
}

async fn fetch(config: &AppConfig, args: &ImageArgs, display_width: u32) -> Result<()> {
    let request = image_request(args)?;
    let mut page = Storefront::new(config);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let fetcher = AssetFetcher::new(AssetFetcherConfig::from(&config.fetch), &event_tx)?;

    let id = page.mount_at(
        request,
        MountOptions::default(),
        Rect::new(0.0, 0.0, f64::from(display_width), f64::from(display_width)),
    );

    let timeout = Duration::from_secs(config.fetch.timeout_secs) + FETCH_GRACE;
    let assets = page.run_fetches(&fetcher, &mut event_rx, timeout).await;

    // Same layout width the fetch was issued for.
    let width = page.layout_width(id).unwrap_or(display_width);
    if let Some(view) = page.pipeline().render(id) {
        if let Some(asset) = &view.asset {
            println!("selected: {}", asset.best_candidate(width));
        }
        println!("{}", view.to_html());
    }
    match (assets.get(&id), page.pipeline().error(id)) {
        (Some(info), _) => println!(
            "{}x{} px, {} bytes from {} ({})",
            info.width, info.height, info.bytes, info.source, info.url
        ),
        (None, Some(reason)) => println!("error: {reason}"),
        (None, None) => println!("state: {}", page.pipeline().state(id).unwrap_or_default()),
    }
    println!("cache: {}", fetcher.cache().stats());

    page.close();
    Ok(())
}

async fn catalog(config: &AppConfig, seed: &Path, columns: u32, steps: u32) -> Result<()> {
    let store = Arc::new(InMemoryCatalog::new());
    let report = SeedCatalogUseCase::new(store.clone())
        .execute_file(seed)
        .await;
    match &report.error {
        None => println!(
            "seeded {} products ({} new, {} already present)",
            report.total,
            report.inserted,
            report.skipped()
        ),
        Some(reason) => println!("seeding failed: {reason}"),
    }

    let products = store.products().await;
    let mut page = Storefront::new(config);
    let viewport = page.viewport();
    let columns = columns.max(1);
    let cell = (viewport.width / f64::from(columns)).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let card_width = cell as u32;

    for (index, product) in (0u32..).zip(&products) {
        let row = index / columns;
        let column = index % columns;
        let request = ImageRequest::new(product.image.clone())
            .with_priority(row == 0)
            .with_responsive(true)
            .with_blur_placeholder(true)
            .with_intent(DisplayIntent {
                width: Some(card_width),
                aspect_ratio: AspectRatio::new(1, 1),
                ..DisplayIntent::default()
            });
        page.mount_at(
            request,
            MountOptions::default()
                .with_test_id(format!("product-{}-image", product.id))
                .with_alt(product.name.clone()),
            Rect::new(
                f64::from(column) * cell,
                f64::from(row) * cell,
                cell,
                cell,
            ),
        );
    }
    println!("{}", page.head().to_html());

    for step in 0..=steps {
        if step > 0 {
            page.scroll_by(viewport.height);
        }
        let fetched = page.complete_all().len();
        let [waiting, pending, loaded, errored] = page.pipeline().state_counts();
        println!(
            "y={:>6.0} fetched={fetched:<3} waiting={waiting} pending={pending} loaded={loaded} errored={errored}",
            page.viewport().y
        );
    }

    info!(
        products = products.len(),
        deferred = page.pipeline().active_observations(),
        "Catalog simulation finished"
    );
    page.close();
    Ok(())
}

fn access(config: &AppConfig, email: &str) {
    let policy = config.access_policy();
    let user = UserIdentity::new(email).with_email(email);
    let verdict = if policy.is_admin(&user) {
        "admin"
    } else {
        "customer"
    };
    println!("{email}: {verdict}");
}

fn print_step(page: &Storefront, id: InstanceId, label: &str) {
    if let Some(html) = page.render_html(id) {
        println!("[{label}]\n{html}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: &str) -> ImageArgs {
        ImageArgs {
            path: path.to_string(),
            priority: false,
            responsive: true,
            blur: true,
            width: Some(640),
            height: None,
            aspect_ratio: Some("4:3".to_string()),
            widths: vec![640, 320],
        }
    }

    #[test]
    fn test_image_request_from_args() {
        let request = image_request(&args("roses/1.jpg")).unwrap();

        assert_eq!(request.logical_path, "roses/1.jpg");
        assert!(request.responsive);
        assert!(request.blur_placeholder);
        assert_eq!(request.display_intent.effective_height(), Some(480));
        assert_eq!(request.widths, vec![640, 320]);
    }

    #[test]
    fn test_image_request_rejects_bad_ratio() {
        let mut bad = args("roses/1.jpg");
        bad.aspect_ratio = Some("wide".to_string());
        assert!(image_request(&bad).is_err());
    }

    #[tokio::test]
    async fn test_catalog_with_missing_seed_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let result = catalog(&AppConfig::default(), &dir.path().join("none.json"), 4, 1).await;
        assert!(result.is_ok());
    }
}
