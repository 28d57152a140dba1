use crate::config::credentials::StoredConfig;
use crate::config::s3::S3DatasetStore;
use crate::config::settings::Settings;
use crate::config::{
    Command, DatasetCommand, DownloadArgs, GeneratorCommand, JobCommand, ProjectCommand,
};
use crate::core::api::ApiClient;
use crate::core::download::DatasetDownloader;
use crate::domain::model::{
    ApiKey, DatasetGrant, DatasetJobId, JobState, KeyValidation, ObjectId, SortOrder,
};
use crate::domain::ports::{DatasetStore, Prompter};
use crate::utils::error::{Result, SbxError};
use crate::utils::style::{field, sbx_style};
use crate::utils::table::{cell, object_rows, render_grid};
use serde_json::{json, Value};
use std::future::Future;
use std::path::PathBuf;

/// Every `sbx` subcommand. Each operation returns the text to print on success.
pub struct Sbx {
    settings: Settings,
    api: ApiClient,
}

impl Sbx {
    pub fn new(settings: Settings) -> Result<Self> {
        let api = ApiClient::new(&settings)?;
        Ok(Self { settings, api })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn execute(&self, command: &Command, prompter: &dyn Prompter) -> Result<String> {
        match command {
            Command::Login => {
                prompter.say(&self.login_banner());
                let key = prompter.prompt(&sbx_style(
                    "Paste the API key from your profile and hit enter, or press ctrl+c to quit",
                ))?;
                self.login(&key).await
            }
            Command::Account => self.account(),
            Command::Project(ProjectCommand::List) => self.project_list().await,
            Command::Project(ProjectCommand::Info { project_id }) => {
                self.project_info(project_id).await
            }
            Command::Generator(GeneratorCommand::List { project_id }) => {
                self.generator_list(project_id).await
            }
            Command::Generator(GeneratorCommand::Info { generator_id }) => {
                self.generator_info(generator_id).await
            }
            Command::Dataset(DatasetCommand::List { project_id }) => {
                self.dataset_list(project_id).await
            }
            Command::Dataset(DatasetCommand::Info { dataset_id }) => {
                self.dataset_info(dataset_id).await
            }
            Command::Dataset(DatasetCommand::Download(args)) => {
                self.dataset_download(args, prompter).await
            }
            Command::Job(JobCommand::List { project_id }) => {
                self.job_list(project_id.as_deref()).await
            }
            Command::Job(JobCommand::Info { job_id }) => self.job_info(job_id).await,
        }
    }

    fn credentials(&self) -> Result<StoredConfig> {
        StoredConfig::load(&self.settings.config_path)
    }

    async fn call(&self, route: &str, body: Value) -> Result<Value> {
        let config = self.credentials()?;
        self.api.post(&config.api.key, route, &body).await
    }

    pub fn login_banner(&self) -> String {
        sbx_style(&format!(
            "Welcome to SBX! Please find your API key(s) at {}",
            self.settings.settings_url()
        ))
    }

    /// Validate `raw_key` against the API and store it with the account details.
    pub async fn login(&self, raw_key: &str) -> Result<String> {
        let key = ApiKey::parse(raw_key)?;
        let validation: KeyValidation = self
            .api
            .post_as(&key, "/user/validate-api-key", &json!({}))
            .await?;

        let config = StoredConfig::new(key, validation.user, validation.company);
        config.save(&self.settings.config_path)?;
        tracing::info!("Logged in as {}", config.user.email);

        Ok(sbx_style(&format!(
            "API key has been validated and stored at {}. You're good to go!",
            self.settings.config_path.display()
        )))
    }

    pub fn account(&self) -> Result<String> {
        let config = self.credentials()?;
        Ok([
            sbx_style("You're currently logged in with the following account information:\n"),
            field("Email", &config.user.email),
            field("Name", &config.user.name),
            field("Organization", &config.company.name),
            String::new(),
        ]
        .join("\n"))
    }

    pub async fn project_list(&self) -> Result<String> {
        let res = self
            .call("/projects/get", json!({ "sort": SortOrder::Desc }))
            .await?;
        let rows = list_rows(&res, "projects", &["project_id", "created_str_utc", "name"])?;
        Ok(render_grid(Some(&["Id", "Date Created", "Name"]), &rows))
    }

    pub async fn project_info(&self, project_id: &str) -> Result<String> {
        let id = ObjectId::parse(project_id)?;
        let res = self.call("/project/get", json!({ "id": id })).await?;
        info_grid(&res, None)
    }

    pub async fn generator_list(&self, project_id: &str) -> Result<String> {
        let id = ObjectId::parse(project_id)?;
        let res = self
            .call(
                "/generators/get",
                json!({ "project_id": id, "sort": SortOrder::Desc }),
            )
            .await?;
        let rows = list_rows(&res, "generators", &["id", "name", "cur_build_name"])?;
        Ok(render_grid(Some(&["Id", "Name", "Build Name"]), &rows))
    }

    pub async fn generator_info(&self, generator_id: &str) -> Result<String> {
        let id = ObjectId::parse(generator_id)?;
        let res = self.call("/generator/get", json!({ "id": id })).await?;
        info_grid(&res, None)
    }

    pub async fn dataset_list(&self, project_id: &str) -> Result<String> {
        let id = ObjectId::parse(project_id)?;
        let res = self
            .call(
                "/datasets/get",
                json!({ "project_id": id, "sort": SortOrder::Desc }),
            )
            .await?;
        let rows = list_rows(&res, "datasets", &["id", "created_str_utc", "name"])?;
        Ok(render_grid(Some(&["Id", "Date Shipped", "Name"]), &rows))
    }

    /// `dataset_id` is the id shown by `dataset list`, not the internal id.
    pub async fn dataset_info(&self, dataset_id: &str) -> Result<String> {
        let id = ObjectId::parse(dataset_id)?;
        let res = self.call("/dataset/get", json!({ "id": id })).await?;
        info_grid(&res, Some("dataset"))
    }

    pub async fn dataset_download(
        &self,
        args: &DownloadArgs,
        prompter: &dyn Prompter,
    ) -> Result<String> {
        let endpoint = self.settings.s3_endpoint.clone();
        self.dataset_download_with(args, prompter, move |grant| {
            S3DatasetStore::from_grant(grant, endpoint)
        })
        .await
    }

    /// Download through a store built by `connect` from the dataset's credentials.
    pub async fn dataset_download_with<S, F, Fut>(
        &self,
        args: &DownloadArgs,
        prompter: &dyn Prompter,
        connect: F,
    ) -> Result<String>
    where
        S: DatasetStore,
        F: FnOnce(DatasetGrant) -> Fut,
        Fut: Future<Output = S>,
    {
        let id = ObjectId::parse(&args.dataset_id)?;
        let res = self
            .call("/user/get-aws-creds", json!({ "id": id }))
            .await?;
        let grant: DatasetGrant =
            serde_json::from_value(res).map_err(|e| SbxError::UnexpectedResponse {
                message: format!("/user/get-aws-creds returned an unexpected shape: {}", e),
            })?;
        let location = grant.location(args.sample)?;

        let root = PathBuf::from(&args.download_dir);
        if !root.exists() {
            let answer = prompter.prompt(&sbx_style(&format!(
                "The path `{}` doesn't exist. Create it and download?",
                args.download_dir
            )))?;
            if answer == "Y" || answer == "y" {
                std::fs::create_dir_all(&root)?;
            } else {
                tracing::info!("Download cancelled");
                return Ok(String::new());
            }
        }

        let store = connect(grant).await;
        let downloader = DatasetDownloader::new(store, self.settings.download_workers)
            .with_progress(self.settings.show_progress);

        prompter.say(&sbx_style("Setting up directory structure"));
        prompter.say(&sbx_style("Starting download..."));
        let report = downloader.download(&location, &root).await?;

        if report.is_complete() {
            Ok(sbx_style("Dataset Ready!"))
        } else {
            Err(SbxError::DownloadFailed {
                failed: report.failed.len(),
                total: report.downloaded + report.failed.len(),
            })
        }
    }

    pub async fn job_list(&self, project_id: Option<&str>) -> Result<String> {
        let mut query = json!({ "sort": SortOrder::Desc });
        if let Some(project_id) = project_id {
            let id = ObjectId::parse(project_id)?;
            query["project_id"] = json!(id);
        }

        let res = self.call("/dataset-jobs/get", query).await?;
        let rows = items(&res, "dataset_jobs")?
            .iter()
            .map(|job| {
                let mut row: Vec<String> = ["id", "created_utc", "finished_utc", "name"]
                    .iter()
                    .map(|column| cell(job.get(*column).unwrap_or(&Value::Null)))
                    .collect();
                row.push(JobState::describe(job.get("state").unwrap_or(&Value::Null)));
                row
            })
            .collect::<Vec<_>>();
        Ok(render_grid(
            Some(&["Id", "Created", "Finished", "Name", "State"]),
            &rows,
        ))
    }

    pub async fn job_info(&self, job_id: &str) -> Result<String> {
        let id = DatasetJobId::parse(job_id)?;
        let res = self.call("/dataset-job/get", json!({ "id": id })).await?;
        info_grid(&res, Some("dataset_job"))
    }
}

fn items<'a>(res: &'a Value, field: &str) -> Result<&'a Vec<Value>> {
    res.get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| SbxError::UnexpectedResponse {
            message: format!("missing `{}` list", field),
        })
}

fn list_rows(res: &Value, field: &str, columns: &[&str]) -> Result<Vec<Vec<String>>> {
    Ok(items(res, field)?
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| cell(item.get(*column).unwrap_or(&Value::Null)))
                .collect()
        })
        .collect())
}

/// Key/value grid of the response, or of one object nested in it.
fn info_grid(res: &Value, nested: Option<&str>) -> Result<String> {
    let target = match nested {
        Some(key) => res.get(key).unwrap_or(&Value::Null),
        None => res,
    };
    let object = target
        .as_object()
        .ok_or_else(|| SbxError::UnexpectedResponse {
            message: format!("expected an object{}", nested.map(|k| format!(" at `{}`", k)).unwrap_or_default()),
        })?;
    Ok(render_grid(None, &object_rows(object)))
}
