//! Secondary full-text index of jobs kept in Elasticsearch.
//!
//! Documents are keyed by the job id rendered as a string. The index is a
//! derived view: the relational store stays authoritative and index writes
//! arrive through queued tasks.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::models::job::JobWithCompany;

pub const JOBS_INDEX: &str = "jobs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub industry: String,
    pub description: String,
    pub location: String,
    pub salary_min: i32,
    pub salary_max: i32,
    pub requirements: String,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    pub job_skills: Vec<String>,
}

impl JobDocument {
    pub fn new(row: JobWithCompany, job_skills: Vec<String>) -> Self {
        let job = row.job;
        Self {
            id: job.id,
            company_id: job.company_id,
            title: job.title,
            industry: job.industry,
            description: job.description,
            location: job.location,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            requirements: job.requirements,
            created_at: job.created_at,
            company_name: row.company_name,
            job_skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHits {
    pub total: i64,
    pub jobs: Vec<JobDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: i64,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: JobDocument,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

/// Query body: fuzzy title match OR fuzzy multi-field match, relevance ordered.
pub fn build_search_query(query: &str, page: i64, page_size: i64) -> Value {
    let from = (page.max(1) - 1).saturating_mul(page_size);
    json!({
        "from": from,
        "size": page_size,
        "track_total_hits": true,
        "query": {
            "bool": {
                "should": [
                    {
                        "match": {
                            "title": {
                                "query": query,
                                "fuzziness": "AUTO"
                            }
                        }
                    },
                    {
                        "multi_match": {
                            "query": query,
                            "fields": ["description", "requirements", "job_skills", "location"],
                            "fuzziness": "AUTO"
                        }
                    }
                ]
            }
        }
    })
}

/// NDJSON body for `_bulk`: one `index` action line plus one source line per document.
pub fn build_bulk_body(docs: &[JobDocument]) -> Result<String> {
    let mut body = String::new();
    for doc in docs {
        let action = json!({ "index": { "_index": JOBS_INDEX, "_id": doc.id.to_string() } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "long" },
                "company_id": { "type": "long" },
                "title": { "type": "text" },
                "industry": { "type": "keyword" },
                "description": { "type": "text" },
                "location": { "type": "text", "fields": { "raw": { "type": "keyword" } } },
                "salary_min": { "type": "integer" },
                "salary_max": { "type": "integer" },
                "requirements": { "type": "text" },
                "created_at": { "type": "date" },
                "company_name": { "type": "text", "fields": { "raw": { "type": "keyword" } } },
                "job_skills": { "type": "text", "fields": { "raw": { "type": "keyword" } } }
            }
        }
    })
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    client: Client,
    base_url: Url,
}

impl SearchIndex {
    pub fn new(address: &str) -> Result<Self> {
        let mut base_url = Url::parse(address)
            .map_err(|e| Error::Config(format!("Invalid ELASTICSEARCH_ADDRESS: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Search(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn fail(response: reqwest::Response, action: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Search(format!("{} failed with status {}: {}", action, status, body))
    }

    /// Creates the index with its mapping unless it already exists.
    pub async fn ensure_index(&self) -> Result<()> {
        let url = self.endpoint(JOBS_INDEX)?;
        let res = self.client.head(url.clone()).send().await?;
        if res.status().is_success() {
            return Ok(());
        }
        if res.status() != StatusCode::NOT_FOUND {
            return Err(Self::fail(res, "index lookup").await);
        }

        let res = self.client.put(url).json(&index_mapping()).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res, "index creation").await);
        }
        tracing::info!(index = JOBS_INDEX, "created search index");
        Ok(())
    }

    pub async fn bulk_load(&self, docs: &[JobDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let body = build_bulk_body(docs)?;
        let res = self
            .client
            .post(self.endpoint("_bulk?refresh=true")?)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res, "bulk load").await);
        }

        let parsed: BulkResponse = res.json().await?;
        if parsed.errors {
            let failed = parsed
                .items
                .iter()
                .filter(|item| item.pointer("/index/error").is_some())
                .count();
            return Err(Error::Search(format!(
                "bulk load rejected {} of {} documents",
                failed,
                docs.len()
            )));
        }
        tracing::info!(documents = docs.len(), "bulk loaded search index");
        Ok(())
    }

    pub async fn upsert(&self, doc: &JobDocument) -> Result<()> {
        let url = self.endpoint(&format!("{}/_doc/{}", JOBS_INDEX, doc.id))?;
        let res = self.client.put(url).json(doc).send().await?;
        if !res.status().is_success() {
            return Err(Self::fail(res, "document upsert").await);
        }
        tracing::debug!(job_id = doc.id, "indexed job");
        Ok(())
    }

    /// Removes a document; a document that is already gone counts as removed.
    pub async fn delete(&self, job_id: i64) -> Result<()> {
        let url = self.endpoint(&format!("{}/_doc/{}", JOBS_INDEX, job_id))?;
        let res = self.client.delete(url).send().await?;
        if res.status().is_success() || res.status() == StatusCode::NOT_FOUND {
            tracing::debug!(job_id, "removed job from index");
            return Ok(());
        }
        Err(Self::fail(res, "document delete").await)
    }

    pub async fn search(&self, query: &str, page: i64, page_size: i64) -> Result<SearchHits> {
        let url = self.endpoint(&format!("{}/_search", JOBS_INDEX))?;
        let res = self
            .client
            .post(url)
            .json(&build_search_query(query, page, page_size))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::fail(res, "search").await);
        }

        let parsed: SearchResponse = res.json().await?;
        let jobs: Vec<JobDocument> = parsed.hits.hits.into_iter().map(|h| h.source).collect();
        let total = parsed
            .hits
            .total
            .map(|t| t.value)
            .unwrap_or(jobs.len() as i64);
        Ok(SearchHits { total, jobs })
    }
}
