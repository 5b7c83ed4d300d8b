//! Command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use bytes::Bytes;
use chrono::Local;
use yard_office::flows::{
    CustomerDashboard, MassDownloader, PhotoManager, ShipmentList, StagedPhoto,
};
use yard_office::http_client::{ApiClient, HttpTransport};
use yard_office::middleware::{AuthContext, AuthGate};
use yard_office::models::{
    validate_date_range, NewShipment, NewUser, NewVessel, ShipmentUpdate, UserUpdate, VesselUpdate,
};
use yard_office::notify::{LogNotifier, Notifier};
use yard_office::routes::AppRoute;
use yard_office::services::{
    AuthService, CustomerShipmentService, ListQuery, PhotoService, ShipmentService, StatsService,
    UserService, VesselService,
};
use yard_office::session::{LocalStorage, Session};
use yard_office::storage::{HttpSignedUrlStorage, SignedUrlStorage};
use yard_office::store::{FilterKey, ListStore, SelectionChange};
use yard_office::Config;

use crate::cli::{
    Cli, Commands, CustomerCommand, ListArgs, OutputFormat, PhotoCommand, ShipmentCommand,
    ShipmentFields, StatsCommand, UserCommand, VesselCommand, VesselFields,
};
use crate::output;

struct App {
    config: Config,
    api: ApiClient,
    auth: AuthService,
    gate: AuthGate,
    storage: LocalStorage,
    notifier: Arc<dyn Notifier>,
    format: OutputFormat,
}

impl App {
    fn new(config: Config, format: OutputFormat) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout_secs)?;
        let api = ApiClient::new(Arc::new(transport));
        let storage = LocalStorage::new(config.session_file.clone());
        let auth = AuthService::new(api.clone());
        let gate = AuthGate::new(auth.clone(), storage.clone(), config.auth_failure_policy);
        Ok(Self {
            config,
            api,
            auth,
            gate,
            storage,
            notifier: Arc::new(LogNotifier),
            format,
        })
    }

    /// Runs the gate for `route`; the command proceeds only on `Allow`.
    async fn enter(&self, route: AppRoute) -> anyhow::Result<AuthContext> {
        self.gate
            .require(route.to_path())
            .await
            .with_context(|| format!("cannot open {}; run `yard-office login` first", route))
    }

    fn signed_url_storage(&self) -> anyhow::Result<Arc<dyn SignedUrlStorage>> {
        Ok(Arc::new(HttpSignedUrlStorage::new(
            self.config.request_timeout_secs,
        )?))
    }

    fn page_size(&self, args: &ListArgs) -> u32 {
        args.limit.unwrap_or(self.config.page_size)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli, config: Config) -> anyhow::Result<()> {
    let app = App::new(config, cli.format)?;

    match cli.command {
        Commands::Login { user_id, password } => {
            let session = app.auth.login(&app.storage, &user_id, &password).await?;
            let home = AppRoute::home_for(session.user.role);
            println!(
                "Signed in as {} ({}); home is {}",
                session.user.name, session.user.role, home
            );
        }
        Commands::Logout => {
            app.auth.logout(&app.storage)?;
            println!("Signed out");
        }
        Commands::Whoami => {
            let Some(session) = Session::load(&app.storage) else {
                bail!("not signed in");
            };
            app.api.set_token(Some(session.access_token));
            let user = app.auth.validate_token().await?;
            if app.format == OutputFormat::Json {
                output::print_json(&user)?;
            } else {
                println!("{} ({})", user.name, user.role);
                if let Some(id) = &user.user_id {
                    println!("User ID: {}", id);
                }
                println!(
                    "Bulk photo download: {}",
                    if user.can_mass_download_photos { "yes" } else { "no" }
                );
            }
        }
        Commands::Shipments(cmd) => shipments(&app, cmd).await?,
        Commands::Vessels(cmd) => vessels(&app, cmd).await?,
        Commands::Users(cmd) => users(&app, cmd).await?,
        Commands::Customer(cmd) => customer(&app, cmd).await?,
        Commands::Photos(cmd) => photos(&app, cmd).await?,
        Commands::Stats(cmd) => stats(&app, cmd).await?,
    }
    Ok(())
}

fn fill_store(store: &mut ListStore, args: &ListArgs, page_size: u32) -> anyhow::Result<()> {
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let filters = [
        (FilterKey::Search, args.search.clone().unwrap_or_default()),
        (FilterKey::ChassisNumber, args.chassis.clone().unwrap_or_default()),
        (FilterKey::ClientId, args.client.clone().unwrap_or_default()),
        (FilterKey::VesselId, args.vessel.clone().unwrap_or_default()),
        (
            FilterKey::Yard,
            args.yard.map(|y| y.to_string()).unwrap_or_default(),
        ),
        (
            FilterKey::ExportStatus,
            args.status.map(|s| s.to_string()).unwrap_or_default(),
        ),
        (FilterKey::DateType, args.date_type.clone().unwrap_or_default()),
        (FilterKey::DateFrom, date(args.from)),
        (FilterKey::DateTo, date(args.to)),
        (FilterKey::JobNumber, args.job_number.clone().unwrap_or_default()),
        (FilterKey::Pod, args.pod.clone().unwrap_or_default()),
    ];
    for (key, value) in filters {
        store.set_filter(key, value);
    }
    validate_date_range(store.filter(FilterKey::DateFrom), store.filter(FilterKey::DateTo))?;

    store.set_page_size(page_size);
    store.set_current_page(args.page);
    for field in &args.sort {
        let next = store.sort().cycle(field);
        store.set_sort_config(next);
    }
    Ok(())
}

fn list_query(args: &ListArgs, page_size: u32) -> anyhow::Result<ListQuery> {
    let mut store = ListStore::new(page_size);
    fill_store(&mut store, args, page_size)?;
    Ok(store.to_query())
}

fn write_export(
    app: &App,
    output: Option<PathBuf>,
    prefix: &str,
    csv: Bytes,
) -> anyhow::Result<()> {
    let path = match output {
        Some(path) => path,
        None => {
            std::fs::create_dir_all(&app.config.download_dir)?;
            app.config.download_dir.join(format!(
                "{}-{}.csv",
                prefix,
                Local::now().format("%Y%m%d-%H%M%S")
            ))
        }
    };
    std::fs::write(&path, &csv).with_context(|| format!("writing {}", path.display()))?;
    println!("Saved {} ({} bytes)", path.display(), csv.len());
    Ok(())
}

fn shipment_list(app: &App, ctx: AuthContext) -> ShipmentList {
    ShipmentList::new(
        ShipmentService::new(app.api.clone()),
        VesselService::new(app.api.clone()),
        app.notifier.clone(),
        ctx,
        app.config.page_size,
    )
}

fn select(list: &mut ShipmentList, ids: &[String]) {
    for id in ids {
        if !list.store().is_selected(id) {
            list.toggle_row(id);
        }
    }
}

fn new_shipment(fields: ShipmentFields) -> NewShipment {
    NewShipment {
        client_id: fields.client.unwrap_or_default(),
        gate_in_date: fields.gate_in,
        gate_out_date: fields.gate_out,
        chassis_number: fields.chassis.unwrap_or_default(),
        make_model: fields.make_model,
        yard: fields.yard,
        vessel_id: fields.vessel,
        export_status: fields.status.unwrap_or_default(),
        remarks: fields.remarks,
    }
}

fn shipment_update(fields: ShipmentFields) -> ShipmentUpdate {
    ShipmentUpdate {
        client_id: fields.client,
        gate_in_date: fields.gate_in,
        gate_out_date: fields.gate_out,
        chassis_number: fields.chassis,
        make_model: fields.make_model,
        yard: fields.yard,
        vessel_id: fields.vessel,
        export_status: fields.status,
        remarks: fields.remarks,
    }
}

async fn shipments(app: &App, cmd: ShipmentCommand) -> anyhow::Result<()> {
    let ctx = app.enter(AppRoute::AdminShipments).await?;
    let today = Local::now().date_naive();
    let mut list = shipment_list(app, ctx);

    match cmd {
        ShipmentCommand::List(args) => {
            let size = app.page_size(&args);
            fill_store(list.store_mut(), &args, size)?;
            list.refresh().await;
            output::shipments(app.format, list.rows(), list.store().pagination(), today)?;
        }
        ShipmentCommand::Show { id } => {
            let shipment = list.shipments().get(&id).await?;
            output::shipment(app.format, &shipment, today)?;
        }
        ShipmentCommand::Create(fields) => {
            let created = list.create(&new_shipment(fields)).await?;
            output::shipment(app.format, &created, today)?;
        }
        ShipmentCommand::Update { id, fields } => {
            let updated = list.update(&id, &shipment_update(fields)).await?;
            output::shipment(app.format, &updated, today)?;
        }
        ShipmentCommand::Remarks { id, text } => {
            let updated = list.shipments().update_remarks(&id, &text).await?;
            output::shipment(app.format, &updated, today)?;
        }
        ShipmentCommand::Delete { id } => list.delete(&id).await?,
        ShipmentCommand::BulkDelete { ids } => {
            select(&mut list, &ids);
            list.bulk_delete().await?;
        }
        ShipmentCommand::AssignVessel {
            vessel,
            new_vessel,
            job_number,
            ids,
        } => {
            select(&mut list, &ids);
            match (vessel, new_vessel) {
                (Some(vessel_id), _) => list.bulk_assign_vessel(&vessel_id).await?,
                (None, Some(name)) => {
                    let vessel = NewVessel {
                        vessel_name: name,
                        job_number: job_number.unwrap_or_default(),
                        ..Default::default()
                    };
                    list.bulk_assign_new_vessel(&vessel).await?;
                }
                (None, None) => bail!("pass --vessel or --new-vessel"),
            }
        }
        ShipmentCommand::AssignGateOut { date, ids } => {
            select(&mut list, &ids);
            list.bulk_assign_gate_out(date).await?;
        }
        ShipmentCommand::Export {
            list: args,
            url_only,
            output,
        } => {
            let query = list_query(&args, app.page_size(&args))?;
            let service = list.shipments();
            if url_only {
                println!("{}", service.export_url(&query.filters));
            } else {
                let csv = service.export_csv(&query.filters).await?;
                write_export(app, output, "shipments", csv)?;
            }
        }
    }
    Ok(())
}

fn new_vessel(fields: VesselFields) -> NewVessel {
    NewVessel {
        vessel_name: fields.name.unwrap_or_default(),
        job_number: fields.job_number.unwrap_or_default(),
        etd: fields.etd,
        shipping_line: fields.shipping_line,
        pod: fields.pod,
    }
}

async fn vessels(app: &App, cmd: VesselCommand) -> anyhow::Result<()> {
    let ctx = app.enter(AppRoute::AdminVessels).await?;
    let service = VesselService::new(app.api.clone());

    match cmd {
        VesselCommand::List(args) => {
            let query = list_query(&args, app.page_size(&args))?;
            let page = service.list(&query).await?;
            output::vessels(app.format, &page.items, &page.pagination)?;
        }
        VesselCommand::Create(fields) => {
            ctx.ensure(ctx.can_edit_vessels(), "create vessels")?;
            let vessel = service.create(&new_vessel(fields)).await?;
            println!("Created vessel {} ({})", vessel.vessel_name, vessel.id);
        }
        VesselCommand::Update { id, fields } => {
            ctx.ensure(ctx.can_edit_vessels(), "edit vessels")?;
            let update = VesselUpdate {
                vessel_name: fields.name,
                job_number: fields.job_number,
                etd: fields.etd,
                shipping_line: fields.shipping_line,
                pod: fields.pod,
            };
            let vessel = service.update(&id, &update).await?;
            println!("Updated vessel {} ({})", vessel.vessel_name, vessel.id);
        }
        VesselCommand::Delete { id } => {
            ctx.ensure(ctx.can_edit_vessels(), "delete vessels")?;
            service.delete(&id).await?;
            println!("Deleted vessel {}", id);
        }
    }
    Ok(())
}

async fn users(app: &App, cmd: UserCommand) -> anyhow::Result<()> {
    let ctx = app.enter(AppRoute::AdminCustomers).await?;
    let service = UserService::new(app.api.clone());

    match cmd {
        UserCommand::List {
            list,
            customers_only,
        } => {
            let query = list_query(&list, app.page_size(&list))?;
            let page = if customers_only {
                service.customers(&query).await?
            } else {
                service.list(&query).await?
            };
            output::users(app.format, &page.items, &page.pagination)?;
        }
        UserCommand::Create {
            name,
            user_id,
            password,
            role,
            mass_download,
        } => {
            ctx.ensure(ctx.can_manage_users(), "create users")?;
            let user = service
                .create(&NewUser {
                    name,
                    user_id,
                    password,
                    role,
                    can_mass_download_photos: mass_download,
                })
                .await?;
            println!("Created {} {} ({})", user.role, user.name, user.id);
        }
        UserCommand::Update {
            id,
            name,
            user_id,
            password,
            role,
            mass_download,
        } => {
            ctx.ensure(ctx.can_manage_users(), "edit users")?;
            let update = UserUpdate {
                name,
                user_id,
                password,
                role,
                can_mass_download_photos: mass_download,
            };
            let user = service.update(&id, &update).await?;
            println!("Updated {} ({})", user.name, user.id);
        }
        UserCommand::Delete { id } => {
            ctx.ensure(ctx.can_manage_users(), "delete users")?;
            service.delete(&id).await?;
            println!("Deleted user {}", id);
        }
    }
    Ok(())
}

async fn customer(app: &App, cmd: CustomerCommand) -> anyhow::Result<()> {
    let ctx = app.enter(AppRoute::CustomerDashboard).await?;
    let today = Local::now().date_naive();
    let mut dashboard = CustomerDashboard::new(
        CustomerShipmentService::new(app.api.clone()),
        app.notifier.clone(),
        ctx,
        app.config.page_size,
    );

    match cmd {
        CustomerCommand::List(args) => {
            let size = app.page_size(&args);
            fill_store(dashboard.store_mut(), &args, size)?;
            dashboard.refresh().await?;
            output::shipments(
                app.format,
                dashboard.rows(),
                dashboard.store().pagination(),
                today,
            )?;
        }
        CustomerCommand::Export {
            list,
            url_only,
            output,
        } => {
            let size = app.page_size(&list);
            fill_store(dashboard.store_mut(), &list, size)?;
            if url_only {
                println!("{}", dashboard.export_url()?);
            } else {
                let csv = dashboard.export_csv().await?;
                write_export(app, output, "my-shipments", csv)?;
            }
        }
        CustomerCommand::Download { ids } => {
            dashboard.refresh().await?;
            let now = Instant::now();
            for id in &ids {
                if let SelectionChange::Rejected { .. } = dashboard.toggle(id, now) {
                    bail!(
                        "at most {} shipments can be downloaded at once",
                        dashboard.selection().cap()
                    );
                }
            }
            let downloader = MassDownloader::new(
                PhotoService::new(app.api.clone()),
                app.signed_url_storage()?,
                app.notifier.clone(),
            );
            let report = dashboard.download_selected(&downloader).await?;
            let path = report.save_to(&app.config.download_dir)?;
            output::download_report(app.format, &report, path.as_deref())?;
        }
    }
    Ok(())
}

fn read_photo(path: &Path) -> anyhow::Result<StagedPhoto> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(StagedPhoto::new(name, data))
}

async fn photos(app: &App, cmd: PhotoCommand) -> anyhow::Result<()> {
    app.enter(AppRoute::AdminShipments).await?;
    let photo_service = PhotoService::new(app.api.clone());
    let shipments = ShipmentService::new(app.api.clone());

    let manager_for = |shipment_id: &str, car| -> anyhow::Result<PhotoManager> {
        Ok(PhotoManager::new(
            photo_service.clone(),
            app.signed_url_storage()?,
            app.notifier.clone(),
            shipment_id,
            car,
        ))
    };

    match cmd {
        PhotoCommand::Upload { shipment, files } => {
            let car = shipments.get(&shipment).await?.car.unwrap_or_default();
            let staged = files
                .iter()
                .map(|p| read_photo(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut manager = manager_for(&shipment, car)?;
            manager.stage_upload(staged)?;
            let summary = manager.save().await;
            output::save_summary(app.format, &summary)?;
            if !summary.is_clean() {
                bail!("some photos were not saved");
            }
        }
        PhotoCommand::Delete { shipment, keys } => {
            let car = shipments.get(&shipment).await?.car.unwrap_or_default();
            let mut manager = manager_for(&shipment, car)?;
            for key in &keys {
                manager.mark_for_deletion(key)?;
            }
            let summary = manager.save().await;
            output::save_summary(app.format, &summary)?;
            if !summary.is_clean() {
                bail!("photo deletion failed");
            }
        }
        PhotoCommand::UploadZip { shipment, file } => {
            let car = shipments.get(&shipment).await?.car.unwrap_or_default();
            let data = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photos.zip".to_string());
            let mut manager = manager_for(&shipment, car)?;
            manager.upload_zip(&name, Bytes::from(data)).await?;
            println!("Uploaded {} to shipment {}", name, shipment);
        }
        PhotoCommand::Urls { shipment } => {
            let links = photo_service.download_urls(&shipment).await?;
            output::download_links(app.format, &links)?;
        }
    }
    Ok(())
}

async fn stats(app: &App, cmd: StatsCommand) -> anyhow::Result<()> {
    app.enter(AppRoute::AdminAnalytics).await?;
    let service = StatsService::new(app.api.clone());
    match cmd {
        StatsCommand::Dashboard => {
            let stats = service.dashboard().await?;
            output::dashboard(app.format, &stats)?;
        }
        StatsCommand::Gates { from, to } => {
            if let (Some(from), Some(to)) = (from, to) {
                if to < from {
                    bail!("--to must be on or after --from");
                }
            }
            let stats = service.gates(from, to).await?;
            output::gates(app.format, &stats)?;
        }
    }
    Ok(())
}
