use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use validoc_core::{
    AppError, ComponentLifetime, DocumentGenerator, GenerationWarning, GeneratorSettings,
    HttpMethod, MultipartOptions, Route, RouteKind, Rule, RuleSchema, Server,
};

fn fields(entries: Vec<(&str, Rule)>) -> RuleSchema {
    RuleSchema::fields(
        entries
            .into_iter()
            .map(|(name, rule)| (name.to_string(), rule))
            .collect(),
    )
}

fn create_user() -> Route {
    Route::new(HttpMethod::Post, "/users")
        .with_action("users.create")
        .with_params(fields(vec![
            ("name", Rule::string()),
            ("age", Rule::number().optional()),
        ]))
}

fn path_keys(doc: &Value) -> Vec<String> {
    doc["paths"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect()
}

#[test]
fn test_get_with_path_and_query_parameter() {
    let route = Route::new(HttpMethod::Get, "/users/{id}")
        .with_action("users.get")
        .with_params(fields(vec![("name", Rule::string().optional())]));
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[route]).unwrap();

    let op = &doc["paths"]["/users/{id}"]["get"];
    assert_eq!(
        op["parameters"],
        json!([
            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } },
            { "name": "name", "in": "query", "required": false, "schema": { "type": "string" } }
        ])
    );
    assert!(op.get("requestBody").is_none());
}

#[test]
fn test_post_body_references_generated_component() {
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[create_user()]).unwrap();

    let body = &doc["paths"]["/users"]["post"]["requestBody"];
    assert_eq!(body["required"], true);
    assert_eq!(
        body["content"]["application/json"]["schema"],
        json!({ "$ref": "#/components/schemas/users.create" })
    );
    assert_eq!(
        doc["components"]["schemas"]["users.create"],
        json!({
            "type": "object",
            "properties": { "name": { "type": "string" }, "age": { "type": "number" } },
            "required": ["name"]
        })
    );
}

#[test]
fn test_path_order_is_independent_of_route_order() {
    let routes = vec![
        Route::new(HttpMethod::Get, "/c").with_action("c"),
        Route::new(HttpMethod::Get, "/a/:x").with_action("ax"),
        Route::new(HttpMethod::Get, "/b").with_action("b"),
        Route::new(HttpMethod::Get, "/a").with_action("a"),
    ];
    let expected = vec!["/a", "/a/{x}", "/b", "/c"];

    let mut permutations = Vec::new();
    for shift in 0..routes.len() {
        let mut rotated = routes.clone();
        rotated.rotate_left(shift);
        permutations.push(rotated.clone());
        rotated.reverse();
        permutations.push(rotated);
    }
    for permutation in permutations {
        let doc = DocumentGenerator::new().generate("3.0.3", &permutation).unwrap();
        assert_eq!(path_keys(&doc), expected);
    }
}

#[test]
fn test_identical_route_on_new_server_appends_server() {
    let route = Route::new(HttpMethod::Get, "/health").with_action("health.check");
    let a = route.clone().with_server(Server::new("https://a.example.com"));
    let b = route.with_server(Server::new("https://b.example.com"));
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[a, b]).unwrap();

    let servers = json!([{ "url": "https://a.example.com" }, { "url": "https://b.example.com" }]);
    assert_eq!(doc["paths"]["/health"]["get"]["servers"], servers);
    assert_eq!(doc["servers"], servers);
    assert!(generator.warnings().is_empty());
}

#[test]
fn test_conflicting_route_is_dropped_with_warning() {
    let first = Route::new(HttpMethod::Get, "/users").with_action("users.list");
    let second = Route::new(HttpMethod::Get, "/users").with_action("users.search");
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[first, second]).unwrap();

    assert_eq!(doc["paths"]["/users"]["get"]["operationId"], "users.list");
    assert_eq!(
        generator.warnings(),
        &[GenerationWarning::DuplicateOperation {
            path: "/users".into(),
            method: "GET".into(),
            claimed_by: "users.list".into(),
        }]
    );
}

#[test]
fn test_later_route_is_dropped_before_it_is_built() {
    let first = Route::new(HttpMethod::Post, "/upload").with_action("files.a");
    let broken = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.b")
        .with_kind(RouteKind::Multipart(MultipartOptions::default()))
        .with_params(RuleSchema::Root(Rule::string()));
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[first, broken]).unwrap();

    assert_eq!(doc["paths"]["/upload"]["post"]["operationId"], "files.a");
    assert_eq!(
        generator.warnings(),
        &[GenerationWarning::DuplicateOperation {
            path: "/upload".into(),
            method: "POST".into(),
            claimed_by: "files.a".into(),
        }]
    );
}

#[test]
fn test_broken_route_on_new_server_is_dropped() {
    let first = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.a")
        .with_server(Server::new("https://a.example.com"));
    let broken = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.a")
        .with_kind(RouteKind::Multipart(MultipartOptions::default()))
        .with_params(RuleSchema::Root(Rule::string()))
        .with_server(Server::new("https://b.example.com"));
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[first, broken]).unwrap();

    assert_eq!(
        doc["paths"]["/upload"]["post"]["servers"],
        json!([{ "url": "https://a.example.com" }])
    );
    assert_eq!(generator.warnings().len(), 1);
    assert!(matches!(
        generator.warnings()[0],
        GenerationWarning::DuplicateOperation { .. }
    ));
}

#[test]
fn test_multipart_with_root_schema_fails() {
    let route = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.upload")
        .with_kind(RouteKind::Multipart(MultipartOptions::default()))
        .with_params(RuleSchema::Root(Rule::string()));
    let err = DocumentGenerator::new()
        .generate("3.1.0", &[route])
        .unwrap_err();
    assert!(matches!(err, AppError::MultipartRootSchema(_)));
}

#[test]
fn test_multipart_with_object_schema_composes_body() {
    let route = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.upload")
        .with_kind(RouteKind::Multipart(MultipartOptions {
            file_field: Some("avatar".into()),
            max_files: Some(1),
        }))
        .with_params(fields(vec![("title", Rule::string())]));
    let doc = DocumentGenerator::new().generate("3.1.0", &[route]).unwrap();

    let schema = &doc["paths"]["/upload"]["post"]["requestBody"]["content"]["multipart/form-data"]
        ["schema"];
    assert_eq!(
        schema["allOf"],
        json!([
            {
                "type": "object",
                "properties": { "avatar": { "type": "string", "format": "binary" } },
                "required": ["avatar"]
            },
            { "$ref": "#/components/schemas/files.upload" }
        ])
    );
    assert_eq!(
        doc["components"]["schemas"]["files.upload"]["required"],
        json!(["title"])
    );
}

#[test]
fn test_multipart_with_root_object_rule_composes_body() {
    let properties = [("title".to_string(), Rule::string())].into_iter().collect();
    let route = Route::new(HttpMethod::Post, "/upload")
        .with_action("files.upload")
        .with_kind(RouteKind::Multipart(MultipartOptions::default()))
        .with_params(RuleSchema::Root(Rule::object(properties)));
    let doc = DocumentGenerator::new().generate("3.1.0", &[route]).unwrap();

    let schema = &doc["paths"]["/upload"]["post"]["requestBody"]["content"]["multipart/form-data"]
        ["schema"];
    assert_eq!(
        schema["allOf"][1],
        json!({ "$ref": "#/components/schemas/files.upload" })
    );
    assert_eq!(
        doc["components"]["schemas"]["files.upload"]["required"],
        json!(["title"])
    );
}

#[test]
fn test_base_component_wins_over_generated_one() {
    let base = json!({
        "components": { "schemas": { "users.create": { "type": "string" } } }
    });
    let mut generator = DocumentGenerator::new().with_base_document(base).unwrap();
    let doc = generator.generate("3.1.0", &[create_user()]).unwrap();

    assert_eq!(
        doc["components"]["schemas"]["users.create"],
        json!({ "type": "string" })
    );
    assert_eq!(
        doc["paths"]["/users"]["post"]["requestBody"]["content"]["application/json"]["schema"],
        json!({ "$ref": "#/components/schemas/users.create" })
    );
}

#[test]
fn test_multi_method_route_shares_its_body_component_silently() {
    let route = Route::new(HttpMethod::Put, "/users/:id")
        .with_methods(&HttpMethod::ANY)
        .with_action("users.upsert")
        .with_params(fields(vec![("name", Rule::string())]));
    let mut generator = DocumentGenerator::new();
    let doc = generator.generate("3.1.0", &[route]).unwrap();

    let item = doc["paths"]["/users/{id}"].as_object().unwrap();
    assert_eq!(item.len(), 5);
    assert!(doc["components"]["schemas"]["users.upsert"].is_object());
    assert!(generator.warnings().is_empty());
}

#[test]
fn test_components_are_scoped_to_one_call_by_default() {
    let orders = Route::new(HttpMethod::Post, "/orders")
        .with_action("orders.create")
        .with_params(fields(vec![("sku", Rule::string())]));
    let mut generator = DocumentGenerator::new();
    generator.generate("3.1.0", &[create_user()]).unwrap();
    let doc = generator.generate("3.1.0", &[orders]).unwrap();

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["orders.create"]);
    assert_eq!(generator.components().len(), 1);
}

#[test]
fn test_persistent_components_accumulate() {
    let settings = GeneratorSettings {
        component_lifetime: ComponentLifetime::Persistent,
        ..GeneratorSettings::default()
    };
    let orders = Route::new(HttpMethod::Post, "/orders")
        .with_action("orders.create")
        .with_params(fields(vec![("sku", Rule::string())]));
    let mut generator = DocumentGenerator::with_settings(settings);
    generator.generate("3.1.0", &[create_user()]).unwrap();
    let doc = generator.generate("3.1.0", &[orders]).unwrap();

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(
        schemas.keys().collect::<Vec<_>>(),
        vec!["users.create", "orders.create"]
    );

    let changed_user = Route::new(HttpMethod::Post, "/users")
        .with_action("users.create")
        .with_params(fields(vec![("email", Rule::string())]));
    generator.generate("3.1.0", &[changed_user]).unwrap();
    assert_eq!(
        generator.warnings(),
        &[GenerationWarning::ComponentCollision {
            name: "users.create".into()
        }]
    );

    generator.reset_components();
    assert!(generator.components().is_empty());
}

#[test]
fn test_whole_document_from_yaml_routes() {
    let routes = r#"
- methods: GET
  path: /users/:id
  action: users.get
  service:
    name: users
  params:
    id: string
    fields: "string|optional"
- methods: POST
  path: /users
  action: users.create
  service:
    name: users
  actionDocs:
    summary: Create a user
  params:
    name: "string|min:2"
    age: "number|optional|integer|positive"
"#;

    let expected = r#"
openapi: 3.1.0
info:
  title: Users
  version: 1.0.0
tags:
  - name: users
servers: []
paths:
  /users:
    post:
      tags: [users]
      summary: "Create a user\n            (users.create)"
      operationId: users.create
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/users.create'
      responses:
        "200":
          description: ""
  /users/{id}:
    get:
      tags: [users]
      summary: (users.get)
      operationId: users.get
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
        - name: fields
          in: query
          required: false
          schema:
            type: string
      responses:
        "200":
          description: ""
components:
  schemas:
    users.create:
      type: object
      properties:
        name:
          type: string
          minLength: 2
        age:
          type: integer
          exclusiveMinimum: 0
      required: [name]
"#;

    let routes: Vec<Route> = serde_yaml::from_str(routes).unwrap();
    let base = json!({ "info": { "title": "Users", "version": "1.0.0" } });
    let mut generator = DocumentGenerator::new().with_base_document(base).unwrap();
    let doc = generator.generate("3.1.0", &routes).unwrap();

    let expected: Value = serde_yaml::from_str(expected).unwrap();
    assert_eq!(doc, expected);
}
