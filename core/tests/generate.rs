use pretty_assertions::assert_eq;
use rpc2oas_core::validation::resolve_local_ref;
use rpc2oas_core::{
    generate_openapi_document, generate_openapi_json, Field, GenerateOptions, HttpMethod,
    NamedShape, RefStrategy, Route, Router, Shape,
};
use serde_json::{json, Value};

fn options() -> GenerateOptions {
    GenerateOptions::new("Test API", "1.0.0", "https://api.example.com")
}

fn user_shape() -> NamedShape {
    NamedShape::new(
        "models:User",
        Shape::object([
            ("id", Field::required(Shape::string())),
            ("name", Field::required(Shape::string())),
            (
                "email",
                Field::optional(Shape::formatted_string("email")).with_description("Contact"),
            ),
        ]),
    )
}

fn id_input() -> Shape {
    Shape::object([("id", Field::required(Shape::string()))])
}

fn collect_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get("$ref") {
                out.push(r.clone());
            }
            map.values().for_each(|v| collect_refs(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, out)),
        _ => {}
    }
}

fn operation_count(doc: &Value) -> usize {
    doc["paths"]
        .as_object()
        .map(|paths| {
            paths
                .values()
                .filter_map(Value::as_object)
                .map(|item| item.len())
                .sum()
        })
        .unwrap_or(0)
}

#[test]
fn get_user_by_id() {
    let router = Router::new().shape(user_shape()).route(
        Route::get("/user/{id}", "getUser", Shape::reference("models:User"))
            .with_input(id_input())
            .protected(),
    );
    let doc = generate_openapi_document(&router, &options()).unwrap();

    assert_eq!(
        doc["paths"]["/user/{id}"]["get"],
        json!({
            "operationId": "getUser",
            "tags": [],
            "parameters": [
                { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
            ],
            "responses": {
                "200": {
                    "description": "Successful response",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/User" }
                        }
                    }
                },
                "default": { "$ref": "#/components/responses/error" }
            },
            "security": [{ "Authorization": [] }]
        })
    );
    assert_eq!(
        doc["components"]["securitySchemes"],
        json!({ "Authorization": { "type": "http", "scheme": "bearer" } })
    );
    assert_eq!(
        doc["components"]["schemas"]["User"]["required"],
        json!(["id", "name"])
    );
}

#[test]
fn get_and_post_share_one_path_item() {
    let item = Shape::object([("name", Field::required(Shape::string()))]);
    let router = Router::new()
        .route(Route::get("/items", "listItems", Shape::array(item.clone())))
        .route(Route::post("/items", "createItem", item.clone()).with_input(item));
    let doc = generate_openapi_document(&router, &options()).unwrap();

    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 1);
    let methods: Vec<_> = paths["/items"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(methods, vec!["get", "post"]);

    let item_ref = json!({ "$ref": "#/components/schemas/ListItemsOutputItem" });
    assert_eq!(
        paths["/items"]["post"]["requestBody"]["content"]["application/json"]["schema"],
        item_ref
    );
    assert_eq!(
        paths["/items"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({ "type": "array", "items": item_ref })
    );
}

#[test]
fn duplicate_route_is_rejected() {
    let router = Router::new()
        .route(Route::post("/items", "createItem", Shape::string()))
        .route(Route::post("/items", "createItemAgain", Shape::string()));
    let err = generate_openapi_document(&router, &options()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration Error in route 'createItemAgain': duplicate route POST /items"
    );
}

#[test]
fn missing_path_parameter_field_is_rejected() {
    let router = Router::new().route(
        Route::get("/user/{userId}", "getUser", Shape::string()).with_input(id_input()),
    );
    let err = generate_openapi_document(&router, &options()).unwrap_err();
    assert_eq!(err.route(), Some("getUser"));
    assert!(err.to_string().contains("`userId`"));
}

#[test]
fn every_route_becomes_one_operation() {
    let mut router = Router::new();
    for (i, method) in [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ]
    .into_iter()
    .enumerate()
    {
        router = router
            .route(Route::new(method, "/things", format!("things{}", i), Shape::boolean()))
            .route(Route::new(method, format!("/other{}", i), format!("other{}", i), Shape::any()));
    }
    let doc = generate_openapi_document(&router, &options()).unwrap();
    assert_eq!(operation_count(&doc), router.routes.len());
}

#[test]
fn shared_shape_is_emitted_once_and_referenced() {
    let report = Shape::object([
        ("total", Field::required(Shape::integer())),
        ("rows", Field::required(Shape::array(Shape::string()))),
    ]);
    let router = Router::new()
        .route(Route::get("/reports/daily", "dailyReport", report.clone()))
        .route(Route::get("/reports/weekly", "weeklyReport", report));
    let doc = generate_openapi_document(&router, &options()).unwrap();

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["DailyReportOutput"]);
    for path in ["/reports/daily", "/reports/weekly"] {
        assert_eq!(
            doc["paths"][path]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"],
            json!({ "$ref": "#/components/schemas/DailyReportOutput" })
        );
    }
}

#[test]
fn nested_shared_shape_is_referenced_everywhere() {
    let user = Shape::object([
        ("id", Field::required(Shape::string())),
        ("name", Field::required(Shape::string())),
    ]);
    let router = Router::new()
        .route(Route::get("/user", "getUser", user.clone()))
        .route(Route::get("/users", "listUsers", Shape::array(user.clone())))
        .route(Route::get(
            "/team",
            "getTeam",
            Shape::object([("lead", Field::required(user))]),
        ));
    let doc = generate_openapi_document(&router, &options()).unwrap();

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["GetUserOutput"]);
    let user_ref = json!({ "$ref": "#/components/schemas/GetUserOutput" });
    let success_schema = |path: &str| {
        doc["paths"][path]["get"]["responses"]["200"]["content"]["application/json"]["schema"]
            .clone()
    };
    assert_eq!(success_schema("/user"), user_ref);
    assert_eq!(success_schema("/users")["items"], user_ref);
    assert_eq!(success_schema("/team")["properties"]["lead"], user_ref);
}

#[test]
fn every_component_is_referenced() {
    let search = Shape::object([
        ("q", Field::required(Shape::string())),
        ("page", Field::optional(Shape::integer())),
        (
            "filter",
            Field::optional(Shape::object([("tag", Field::required(Shape::string()))])),
        ),
    ]);
    let router = Router::new()
        .route(Route::get("/a", "searchA", Shape::string()).with_input(search.clone()))
        .route(Route::get("/b", "searchB", Shape::string()).with_input(search.clone()))
        .route(Route::post("/c/{q}", "searchC", Shape::string()).with_input(search.clone()))
        .route(Route::post("/d", "searchD", Shape::string()).with_input(search.clone()))
        .route(Route::post("/e", "searchE", Shape::string()).with_input(search));
    let doc = generate_openapi_document(&router, &options()).unwrap();

    let mut refs = Vec::new();
    collect_refs(&doc["paths"], &mut refs);
    collect_refs(&doc["components"]["schemas"], &mut refs);
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(
        schemas.keys().collect::<Vec<_>>(),
        vec!["SearchAInputFilter", "SearchDInput"]
    );
    for name in schemas.keys() {
        let target = format!("#/components/schemas/{}", name);
        assert!(refs.contains(&target), "{} is never referenced", name);
    }
}

#[test]
fn generation_is_idempotent() {
    let router = Router::new()
        .shape(user_shape())
        .route(Route::get("/user/{id}", "getUser", Shape::reference("models:User")).with_input(id_input()))
        .route(
            Route::post("/user", "createUser", Shape::reference("models:User"))
                .with_input(Shape::reference("models:User"))
                .protected(),
        );
    let opts = options().with_tags(["users"]);
    let first = generate_openapi_json(&router, &opts).unwrap();
    let second = generate_openapi_json(&router, &opts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn all_references_resolve() {
    let router = Router::new()
        .shape(user_shape())
        .shape(NamedShape::new(
            "models:Team",
            Shape::object([
                ("members", Field::required(Shape::array(Shape::reference("models:User")))),
                ("lead", Field::required(Shape::reference("models:User").nullable())),
            ]),
        ))
        .route(Route::get("/team", "getTeam", Shape::reference("models:Team")))
        .route(
            Route::post("/team", "createTeam", Shape::reference("models:Team"))
                .with_input(Shape::reference("models:Team")),
        );
    let doc = generate_openapi_document(&router, &options()).unwrap();

    let mut refs = Vec::new();
    collect_refs(&doc, &mut refs);
    assert!(!refs.is_empty());
    for reference in refs {
        assert!(
            resolve_local_ref(&doc, &reference).is_some(),
            "unresolved {}",
            reference
        );
    }
}

#[test]
fn inline_strategy_emits_no_schemas() {
    let router = Router::new()
        .shape(user_shape())
        .route(Route::get("/user/{id}", "getUser", Shape::reference("models:User")).with_input(id_input()));
    let opts = options().with_ref_strategy(RefStrategy::None);
    let doc = generate_openapi_document(&router, &opts).unwrap();
    assert_eq!(doc["components"]["schemas"], json!({}));
    assert_eq!(
        doc["paths"]["/user/{id}"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"]["type"],
        json!("object")
    );
}

#[test]
fn router_loaded_from_yaml() {
    let yaml = r#"
shapes:
  - id: "models:Item"
    description: "A stored item"
    shape:
      type: object
      fields:
        id: { type: integer, format: int64 }
        label: { type: string, optional: true }
routes:
  - method: DELETE
    path: /items/{id}
    operationId: deleteItem
    tags: [items]
    input:
      type: object
      fields:
        id: { type: integer, format: int64 }
        force: { type: boolean, optional: true }
    output: { type: ref, id: "models:Item" }
    protect: true
"#;
    let router = Router::from_yaml_str(yaml).unwrap();
    let doc = generate_openapi_document(&router, &options().with_tags(["items"])).unwrap();

    let op = &doc["paths"]["/items/{id}"]["delete"];
    assert_eq!(op["tags"], json!(["items"]));
    assert_eq!(
        op["parameters"],
        json!([
            { "name": "id", "in": "path", "required": true,
              "schema": { "type": "integer", "format": "int64" } },
            { "name": "force", "in": "query", "required": false,
              "schema": { "type": "boolean" } }
        ])
    );
    assert_eq!(
        doc["components"]["schemas"]["Item"]["description"],
        json!("A stored item")
    );
    assert_eq!(doc["tags"], json!([{ "name": "items" }]));
}
