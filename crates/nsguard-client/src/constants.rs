// Portal API paths, as path segments so every identifier is escaped

pub mod portal_api_path {
    // User
    pub fn current_user() -> Vec<&'static str> {
        vec!["user"]
    }

    // Permission
    pub fn app_role_users(app_id: &str) -> Vec<&str> {
        vec!["apps", app_id, "role_users"]
    }

    // Namespace
    pub fn namespace<'a>(
        app_id: &'a str,
        env: &'a str,
        cluster_name: &'a str,
        namespace_name: &'a str,
    ) -> Vec<&'a str> {
        vec![
            "apps",
            app_id,
            "envs",
            env,
            "clusters",
            cluster_name,
            "namespaces",
            namespace_name,
        ]
    }

    pub fn namespace_branch<'a>(
        app_id: &'a str,
        env: &'a str,
        cluster_name: &'a str,
        namespace_name: &'a str,
    ) -> Vec<&'a str> {
        let mut segments = namespace(app_id, env, cluster_name, namespace_name);
        segments.push("branches");
        segments
    }

    pub fn associated_namespaces<'a>(env: &'a str, namespace_name: &'a str) -> Vec<&'a str> {
        vec![
            "envs",
            env,
            "appnamespaces",
            namespace_name,
            "associated-namespaces",
        ]
    }

    // Instance
    pub fn instance_count_by_namespace(env: &str) -> Vec<&str> {
        vec!["envs", env, "instances", "by-namespace", "count"]
    }

    pub fn instances_by_release(env: &str) -> Vec<&str> {
        vec!["envs", env, "instances", "by-release"]
    }
}
