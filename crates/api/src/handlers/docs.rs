//! OpenAPI document
//!
//! Built from a route table rather than annotations: every resource gets
//! the five CRUD operations, plus its finder routes listed below.

use crate::AppState;
use athena_common::VERSION;
use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

const TITLE: &str = "Athena API";
const DESCRIPTION: &str = "AI-powered federal contract intelligence platform - REST API for government contract \
                           discovery, AI scoring, teaming intelligence, and competitive analysis";

/// A mounted resource: path segment, tag and finder routes
struct Resource {
    path: &'static str,
    tag: &'static str,
    finders: &'static [(&'static str, &'static str, &'static str)],
}

const GET: &str = "get";
const POST: &str = "post";

const RESOURCES: &[Resource] = &[
    Resource {
        path: "agencies",
        tag: "Agencies",
        finders: &[
            (GET, "/abbreviation/{abbreviation}", "Find agency by abbreviation"),
            (GET, "/search", "Search agencies by name"),
            (GET, "/active", "List active agencies"),
            (GET, "/{id}/sub-agencies", "List sub-agencies"),
            (GET, "/department/{department}", "List agencies in a department"),
        ],
    },
    Resource {
        path: "alerts",
        tag: "Alerts",
        finders: &[
            (GET, "/user/{id}", "List alerts for a user"),
            (GET, "/user/{id}/active", "List active alerts for a user"),
            (GET, "/type/{alert_type}", "List alerts by type"),
            (POST, "/{id}/trigger", "Record alert trigger"),
        ],
    },
    Resource {
        path: "attachments",
        tag: "Attachments",
        finders: &[
            (GET, "/opportunity/{id}", "List attachments for an opportunity"),
            (GET, "/type/{attachment_type}", "List attachments by type"),
            (GET, "/sam/{sam_attachment_id}", "Find attachment by SAM.gov id"),
        ],
    },
    Resource {
        path: "awards",
        tag: "Awards",
        finders: &[
            (GET, "/contract/{contract_number}", "Find award by contract number"),
            (GET, "/active", "List active awards"),
            (GET, "/date-range", "List awards in a date range"),
            (GET, "/naics/{code}", "List awards by NAICS code"),
            (GET, "/awardee/{uei}", "List awards by awardee UEI"),
        ],
    },
    Resource {
        path: "competitor-intel",
        tag: "Competitor Intelligence",
        finders: &[
            (GET, "/opportunity/{id}", "List intel for an opportunity"),
            (GET, "/organization/{id}", "List intel for an organization"),
            (GET, "/likelihood/{likelihood}", "List intel by bid likelihood"),
        ],
    },
    Resource {
        path: "contacts",
        tag: "Contacts",
        finders: &[
            (GET, "/email/{email}", "Find contact by email"),
            (GET, "/organization/{id}", "List contacts for an organization"),
            (GET, "/organization/{id}/primary", "Primary contact for an organization"),
            (GET, "/agency/{id}", "List contacts for an agency"),
            (GET, "/agency/{id}/primary", "Primary contact for an agency"),
            (GET, "/opportunity/{id}", "List contacts for an opportunity"),
            (GET, "/opportunity/{id}/primary", "Primary contact for an opportunity"),
            (GET, "/type/{contact_type}", "List contacts by type"),
        ],
    },
    Resource {
        path: "contract-vehicles",
        tag: "Contract Vehicles",
        finders: &[(GET, "/code/{code}", "Find contract vehicle by code")],
    },
    Resource {
        path: "historical-data",
        tag: "Historical Data",
        finders: &[
            (GET, "/entity/{id}", "List history for an entity"),
            (GET, "/entity-type/{entity_type}/entity/{id}", "List history for a typed entity"),
            (GET, "/data-type/{data_type}", "List history by data type"),
            (GET, "/date-range", "List history captured in a window"),
            (GET, "/entity-type/{entity_type}", "List history by entity type"),
        ],
    },
    Resource {
        path: "naics",
        tag: "NAICS",
        finders: &[(GET, "/code/{code}", "Find NAICS code")],
    },
    Resource {
        path: "notice-types",
        tag: "Notice Types",
        finders: &[(GET, "/code/{code}", "Find notice type by code")],
    },
    Resource {
        path: "opportunities",
        tag: "Opportunities",
        finders: &[
            (GET, "/notice/{notice_id}", "Find opportunity by notice id"),
            (GET, "/active", "List active opportunities"),
            (GET, "/naics/{code}", "List opportunities by NAICS code"),
            (GET, "/notice-type/{notice_type}", "List opportunities by notice type"),
            (GET, "/agency/{id}", "List opportunities for an agency"),
            (GET, "/posted-after", "List opportunities posted after a date"),
            (GET, "/expiring-before", "List opportunities due before a deadline"),
            (GET, "/upcoming-deadlines", "List opportunities due in the next N days"),
            (GET, "/search", "Search opportunities by title"),
        ],
    },
    Resource {
        path: "opportunity-scores",
        tag: "Opportunity Scores",
        finders: &[
            (GET, "/opportunity/{id}", "List scores for an opportunity"),
            (GET, "/type/{score_type}", "List scores by type"),
            (GET, "/opportunity/{id}/type/{score_type}/latest", "Latest score of a type"),
        ],
    },
    Resource {
        path: "organizations",
        tag: "Organizations",
        finders: &[
            (GET, "/uei/{uei}", "Find organization by UEI"),
            (GET, "/cage/{cage_code}", "Find organization by CAGE code"),
            (GET, "/search", "Search organizations by name"),
            (GET, "/naics/{naics}", "List organizations by primary NAICS"),
            (GET, "/small-business", "List small businesses"),
        ],
    },
    Resource {
        path: "saved-searches",
        tag: "Saved Searches",
        finders: &[
            (GET, "/user/{id}", "List saved searches for a user"),
            (GET, "/user/{id}/active", "List active saved searches for a user"),
            (POST, "/{id}/execute", "Record search execution"),
        ],
    },
    Resource {
        path: "set-asides",
        tag: "Set-Asides",
        finders: &[(GET, "/code/{code}", "Find set-aside by code")],
    },
    Resource {
        path: "sync-logs",
        tag: "Sync Logs",
        finders: &[
            (GET, "/status/{status}", "List runs by status"),
            (GET, "/sync-type/{sync_type}", "List runs by type"),
            (GET, "/date-range", "List runs started in a window"),
            (GET, "/recent", "List most recent runs"),
            (GET, "/failed", "List failed runs"),
        ],
    },
    Resource {
        path: "teams",
        tag: "Teams",
        finders: &[
            (GET, "/lead-organization/{id}", "List teams led by an organization"),
            (GET, "/opportunity/{id}", "List teams pursuing an opportunity"),
            (GET, "/status/{status}", "List teams by status"),
            (GET, "/created-by/{id}", "List teams created by a user"),
        ],
    },
    Resource {
        path: "team-members",
        tag: "Team Members",
        finders: &[
            (GET, "/team/{id}", "List members of a team"),
            (GET, "/organization/{id}", "List team memberships of an organization"),
            (GET, "/team/{id}/prime-contractors", "List prime contractors of a team"),
        ],
    },
    Resource {
        path: "users",
        tag: "Users",
        finders: &[
            (GET, "/email/{email}", "Find user by email"),
            (GET, "/username/{username}", "Find user by username"),
        ],
    },
];

fn operation(tag: &str, summary: &str, secured: bool) -> Value {
    let mut op = json!({ "tags": [tag], "summary": summary });
    if !secured {
        op["security"] = json!([]);
    }
    op
}

fn add(paths: &mut Map<String, Value>, path: String, method: &str, op: Value) {
    let entry = paths.entry(path).or_insert_with(|| json!({}));
    entry[method] = op;
}

/// Build the full document for routes mounted under `api_prefix`
pub fn document(api_prefix: &str) -> Value {
    let mut paths = Map::new();

    add(&mut paths, "/health".into(), GET, operation("Health", "Liveness probe", false));
    add(&mut paths, "/ready".into(), GET, operation("Health", "Readiness probe", false));
    add(&mut paths, "/metrics".into(), GET, operation("Health", "Prometheus metrics", false));
    add(
        &mut paths,
        format!("{}/auth/login", api_prefix),
        POST,
        operation("Authentication", "Exchange credentials for a bearer token", false),
    );

    for resource in RESOURCES {
        let base = format!("{}/{}", api_prefix, resource.path);
        let item = format!("{}/{{id}}", base);
        let tag = resource.tag;
        // Sign-up is open
        let public_create = resource.path == "users";

        add(&mut paths, base.clone(), GET, operation(tag, "List (paged)", true));
        add(&mut paths, base.clone(), POST, operation(tag, "Create", !public_create));
        add(&mut paths, item.clone(), GET, operation(tag, "Get by id", true));
        add(&mut paths, item.clone(), "put", operation(tag, "Update", true));
        add(&mut paths, item, "delete", operation(tag, "Delete", true));

        for (method, suffix, summary) in resource.finders {
            add(&mut paths, format!("{}{}", base, suffix), method, operation(tag, summary, true));
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": TITLE,
            "version": VERSION,
            "description": DESCRIPTION,
        },
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            }
        },
        "security": [{ "bearerAuth": [] }],
    })
}

pub async fn openapi(State(state): State<AppState>) -> Json<Value> {
    Json(document(&state.config.server.api_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_info_and_tags() {
        let doc = document("/api");
        assert_eq!(doc["info"]["title"], "Athena API");
        assert_eq!(doc["info"]["version"], "0.1.0");

        let latest = &doc["paths"]["/api/opportunity-scores/opportunity/{id}/type/{score_type}/latest"]["get"];
        assert_eq!(latest["tags"][0], "Opportunity Scores");

        assert_eq!(doc["paths"]["/api/users"]["post"]["security"], json!([]));
        assert!(doc["paths"]["/api/users/{id}"]["delete"].get("security").is_none());
        assert_eq!(doc["paths"]["/api/alerts/{id}/trigger"]["post"]["tags"][0], "Alerts");
    }

    #[test]
    fn test_every_resource_has_crud() {
        let doc = document("/api");
        for resource in RESOURCES {
            let base = format!("/api/{}", resource.path);
            assert!(doc["paths"][&base]["get"].is_object(), "{}", base);
            assert!(doc["paths"][format!("{}/{{id}}", base)]["delete"].is_object(), "{}", base);
        }
        assert_eq!(RESOURCES.len(), 19);
    }
}
