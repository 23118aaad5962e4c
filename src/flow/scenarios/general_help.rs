use futures::future::BoxFuture;

use super::{field, next_missing_contact, store_submission};
use crate::external::http::client::{generate_success_message, submit_ticket, TicketType};
use crate::external::Services;
use crate::flow::rt::context::{or_not_provided, Context};
use crate::flow::rt::step::{ChatState, Flow, FlowStep, Role, START};
use crate::flow::validation::{process_optional_input, validate_email, validate_optional};

const SUBMIT: &str = "Submit Ticket";
const NO_KEYWORD: &str = "I don't see a relevant keyword";
const MAX_KEYWORDS: usize = 5;

/// Routing keywords offered by the support queue; the closing sentinel lets
/// users propose their own.
const KEYWORDS: &[&str] = &[
    " C, C++",
    "Abaqus",
    "ACCESS",
    "ACCESS-credits",
    "ACCESS-website",
    "Accounts",
    "ACLS",
    "Adding users",
    "Affiliations",
    "Affinity Groups",
    "AI",
    "Algorithms",
    "Allocation extension",
    "Allocation Management",
    "Allocation proposal",
    "Allocation Time",
    "Allocation users",
    "AMBER",
    "AMIE",
    "Anaconda",
    "Analysis",
    "API",
    "Application Status",
    "ARCGIS",
    "Architecture",
    "Archiving",
    "Astrophysics",
    "ATLAS",
    "Authentication",
    "AWS",
    "AZURE",
    "Backup",
    "BASH",
    "Batch Jobs",
    "Benchmarking",
    "Big Data",
    "Bioinformatics",
    "Biology",
    "Ceph",
    "CFD",
    "cgroups",
    "CHARMM",
    "Checkpoint",
    "cilogon",
    "citation",
    "Cloud",
    "Cloud Computing",
    "Cloud Lab",
    "Cloud Storage",
    "Cluster Management",
    "Cluster Support",
    "CMMC",
    "Community Outreach",
    "Compiling",
    "Composible Systems",
    "Computataional Chemistry",
    "COMSOL",
    "Conda",
    "Condo",
    "Containers",
    "Core dump",
    "Core hours",
    "CP2K",
    "CPU architecture",
    "CPU bound",
    "CUDA",
    "Cybersecurity",
    "CYVERSE",
    "Data",
    "Data Storage",
    "Data-access-protocols",
    "Data-analysis",
    "Data-compliance",
    "Data-lifecycle",
    "Data-management",
    "Data-management-software",
    "Data-provenance",
    "Data-reproducibility",
    "Data-retention",
    "Data-science",
    "Data-sharing",
    "Data-transfer",
    "Data-wrangling",
    "Database-update",
    "Debugging",
    "Debugging, Optimizatio and Profiling",
    "Deep-learning",
    "Dependencies",
    "Deployment",
    "DFT",
    "Distributed-computing",
    "DNS",
    "Docker",
    "Documentation",
    "DOI",
    "DTN",
    "Easybuild",
    "Email",
    "Encryption",
    "Environment-modules",
    "Errors",
    "Extension",
    "FastX",
    "Federated-authentication",
    "File transfers",
    "File-formats",
    "File-limits",
    "File-systems",
    "File-transfer",
    "Finite-element-analysis",
    "Firewall",
    "Fortran",
    "Frameworks and IDE's",
    "GAMESS",
    "Gateways",
    "GATK",
    "Gaussian",
    "GCC",
    "Genomics",
    "GIS",
    "Git",
    "Globus",
    "GPFS",
    "GPU",
    "Gravitational-waves",
    "Gridengine",
    "GROMACS",
    "Hadoop",
    "Hardware",
    "Image-processing",
    "Infiniband",
    "Interactive-mode",
    "Interconnect",
    "IO-Issue",
    "ISILON",
    "Java",
    "Jekyll",
    "Jetstream",
    "Job-accounting",
    "Job-array",
    "Job-charging",
    "Job-failure",
    "Job-sizing",
    "Job-submission",
    "Julia",
    "Jupyterhub",
    "Key-management",
    "Kubernetes",
    "KyRIC",
    "LAMMPS",
    "Library-paths",
    "License",
    "Linear-programming",
    "Linux",
    "LMOD",
    "login",
    "LSF",
    "Lustre",
    "Machine-learning",
    "Management",
    "Materials-science",
    "Mathematica",
    "MATLAB",
    "Memory",
    "Metadata",
    "Modules",
    "Molecular-dynamics",
    "Monte-carlo",
    "MPI",
    "NAMD",
    "NetCDF",
    "Networking",
    "Neural-networks",
    "NFS",
    "NLP",
    "NoMachine",
    "Nvidia",
    "Oceanography",
    "OnDemnad",
    "Open-science-grid",
    "Open-storage-network",
    "OpenCV",
    "Openfoam",
    "OpenMP",
    "OpenMPI",
    "OpenSHIFT",
    "Openstack",
    "Optimization",
    "OS",
    "OSG",
    "Parallelization",
    "Parameter-sweeps",
    "Paraview",
    "Particle-physics",
    "password",
    "PBS",
    "Pegasus",
    "Pending-jobs",
    "Performance-tuning",
    "Permissions",
    "Physiology",
    "PIP",
    "PODMAN",
    "Portals",
    "Pre-emption",
    "Professional and Workforce Development",
    "Professional-development",
    "Profile",
    "Profiling",
    "Programming",
    "Programming Languages",
    "Programming-best-practices",
    "Project-management",
    "Project-renewal",
    "Provisioning",
    "Pthreads",
    "Publication-database",
    "Putty",
    "Python",
    "Pytorch",
    "Quantum-computing",
    "Quantum-mechanics",
    "Quota",
    "R",
    "RDP",
    "React",
    "Reporting",
    "Research-facilitation",
    "Research-grants",
    "Resources",
    "Rstudio-server",
    "S3",
    "Samba",
    "SAS",
    "Scaling",
    "Schedulers",
    "Scheduling",
    "Science DMZ",
    "Science Gateways",
    "Scikit-learn",
    "Scratch",
    "screen",
    "scripting",
    "SDN",
    "Secure Computing and Data",
    "Secure-data-architecture",
    "Serverless-hpc",
    "setup",
    "sftp",
    "SGE",
    "Shell Scripting",
    "Shifter",
    "Singularity",
    "SLURM",
    "SMB",
    "Smrtanalysis",
    "Software Installations",
    "Software-carpentry",
    "SPACK",
    "SPARK",
    "Spectrum-scale",
    "SPSS",
    "SQL",
    "SSH",
    "Stampede2",
    "STATA",
    "Storage",
    "Supplement",
    "Support",
    "TCP",
    "Technical-training-for-hpc",
    "Tensorflow",
    "Terminal-emulation-and-window-management",
    "Tickets",
    "Timing-issue",
    "TMUX",
    "Tools",
    "Training",
    "Transfer SUs",
    "Trinity",
    "Tuning",
    "Unix-environment",
    "Upgrading",
    "Vectorization",
    "Version-control",
    "vim",
    "VNC",
    "VPN",
    "Workflow",
    "Workforce-development",
    "X11",
    "Xalt",
    "XDMoD",
    "XML",
    "XSEDE",
    NO_KEYWORD,
];

const RESOURCES: &[&str] = &[
    "ACES",
    "Anvil",
    "Bridges-2",
    "DARWIN",
    "Delta",
    "DeltaAI",
    "Derecho",
    "Expanse",
    "FASTER",
    "Granite",
    "Jetstream2",
    "KyRIC",
    "Launch",
    "Neocortex",
    "Ookami",
    "Open Science Grid",
    "Open Storage Network",
    "Ranch",
    "Stampede3",
];

fn set_summary(chat: &ChatState, ctx: &mut Context) {
    ctx.form.summary = Some(chat.user_input.clone());
}

fn set_category(chat: &ChatState, ctx: &mut Context) {
    ctx.form.category = Some(chat.user_input.clone());
}

fn set_description(chat: &ChatState, ctx: &mut Context) {
    ctx.form.description = Some(chat.user_input.clone());
}

fn set_wants_attachment(chat: &ChatState, ctx: &mut Context) {
    ctx.form.wants_attachment = Some(chat.user_input.clone());
}

fn route_attachment(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == "Yes" {
        String::from("general_help_upload")
    } else {
        String::from("general_help_resource")
    }
}

fn confirm_upload(_chat: &ChatState, ctx: &mut Context) {
    ctx.form.upload_confirmed = true;
}

fn set_involves_resource(chat: &ChatState, ctx: &mut Context) {
    ctx.form.involves_resource = Some(chat.user_input.to_lowercase());
}

fn route_resource(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == "Yes" {
        String::from("general_help_resource_details")
    } else {
        String::from("general_help_keywords")
    }
}

fn set_resource_name(chat: &ChatState, ctx: &mut Context) {
    ctx.form.resource_name = Some(chat.user_input.clone());
}

fn set_user_id_at_resource(chat: &ChatState, ctx: &mut Context) {
    ctx.form.user_id_at_resource = Some(process_optional_input(&chat.user_input));
}

fn set_keywords(chat: &ChatState, ctx: &mut Context) {
    ctx.form.keywords = Some(chat.user_input.clone());
}

fn route_keywords(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input.contains(NO_KEYWORD) {
        String::from("general_help_additional_keywords")
    } else {
        String::from("general_help_priority")
    }
}

/// Folds the free-text keywords into the selected ones, dropping the
/// sentinel entry, and records the suggestion separately for the ProForma
/// field.
fn merge_additional_keywords(chat: &ChatState, ctx: &mut Context) {
    let additional = chat.user_input.clone();
    let existing = ctx.form.keywords.take().unwrap_or_default();
    let kept: Vec<&str> = existing
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty() && *k != NO_KEYWORD)
        .collect();
    ctx.form.keywords = Some(if kept.is_empty() {
        additional.clone()
    } else {
        format!("{}, {}", kept.join(", "), additional)
    });
    ctx.form.suggested_keyword = Some(additional);
}

fn set_priority(chat: &ChatState, ctx: &mut Context) {
    ctx.form.priority = Some(chat.user_input.to_lowercase());
}

fn route_contact(_chat: &ChatState, ctx: &Context) -> String {
    next_missing_contact(
        ctx,
        "general_help_email",
        "general_help_name",
        "general_help_accessid",
        "general_help_ticket_summary",
    )
}

fn set_email(chat: &ChatState, ctx: &mut Context) {
    ctx.form.email = Some(chat.user_input.clone());
}

fn set_name(chat: &ChatState, ctx: &mut Context) {
    ctx.form.name = Some(chat.user_input.clone());
}

fn set_access_id(chat: &ChatState, ctx: &mut Context) {
    ctx.form.access_id = Some(process_optional_input(&chat.user_input));
}

fn summary_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    let mut resource_info = String::new();
    if ctx.form.involves_resource.as_deref() == Some("yes") {
        resource_info = format!(
            "\nResource: {}",
            ctx.form.resource_name.as_deref().unwrap_or("Not specified")
        );
        if let Some(user_id) = ctx
            .form
            .user_id_at_resource
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            resource_info.push_str(&format!("\nUser ID at Resource: {}", user_id));
        }
    }
    format!(
        "Thank you for providing your issue details. Here's a summary:\n\n\
         Name: {}\n\
         Email: {}\n\
         ACCESS ID: {}\n\
         Issue Summary: {}\n\
         Category: {}\n\
         Priority: {}\n\
         Keywords: {}\n\
         Issue Description: {}{}{}\n\n\
         Would you like to submit this ticket?",
        or_not_provided(ctx.effective_name()),
        or_not_provided(ctx.effective_email()),
        or_not_provided(ctx.effective_access_id()),
        or_not_provided(ctx.form.summary.as_deref()),
        or_not_provided(ctx.form.category.as_deref()),
        or_not_provided(ctx.form.priority.as_deref()),
        or_not_provided(ctx.form.keywords.as_deref()),
        or_not_provided(ctx.form.description.as_deref()),
        resource_info,
        ctx.file_info()
    )
}

fn submit<'a>(
    chat: &'a ChatState,
    ctx: &'a mut Context,
    services: &'a Services,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if chat.user_input != SUBMIT {
            return;
        }
        let involves_resource = ctx.form.involves_resource.as_deref() == Some("yes");
        let has_suggestion = ctx
            .form
            .suggested_keyword
            .as_deref()
            .is_some_and(|s| !s.is_empty());
        let mut fields = serde_json::Map::new();
        fields.insert(String::from("email"), field(ctx.effective_email()));
        fields.insert(
            String::from("summary"),
            serde_json::Value::String(String::from(
                ctx.form.summary.as_deref().unwrap_or("General Support Ticket"),
            )),
        );
        fields.insert(
            String::from("description"),
            field(ctx.form.description.as_deref()),
        );
        fields.insert(
            String::from("priority"),
            serde_json::Value::String(String::from(
                ctx.form.priority.as_deref().unwrap_or("medium"),
            )),
        );
        fields.insert(String::from("accessId"), field(ctx.effective_access_id()));
        fields.insert(String::from("name"), field(ctx.effective_name()));
        fields.insert(String::from("issueType"), field(ctx.form.category.as_deref()));
        // ProForma fields for the general support request type.
        fields.insert(
            String::from("hasResourceProblem"),
            serde_json::Value::String(String::from(if involves_resource { "Yes" } else { "No" })),
        );
        fields.insert(
            String::from("userIdAtResource"),
            field(ctx.form.user_id_at_resource.as_deref()),
        );
        fields.insert(
            String::from("resourceName"),
            field(ctx.form.resource_name.as_deref()),
        );
        fields.insert(String::from("keywords"), field(ctx.form.keywords.as_deref()));
        fields.insert(
            String::from("noRelevantKeyword"),
            serde_json::Value::String(String::from(if has_suggestion { "checked" } else { "" })),
        );
        fields.insert(
            String::from("suggestedKeyword"),
            field(ctx.form.suggested_keyword.as_deref()),
        );
        let files = ctx.form.uploaded_files.clone();
        let result = submit_ticket(services, fields, TicketType::GeneralSupport, &files).await;
        store_submission(ctx, services, result, "general-support");
    })
}

fn route_summary(chat: &ChatState, _ctx: &Context) -> String {
    if chat.user_input == SUBMIT {
        String::from("general_help_success")
    } else {
        String::from(START)
    }
}

fn success_message(_chat: &ChatState, ctx: &Context, _services: &Services) -> String {
    generate_success_message(ctx.submission.as_ref(), "support ticket")
}

pub fn flow() -> Flow {
    let mut flow = Flow::new();
    flow.insert(
        "general_help_summary_subject",
        FlowStep::say("Provide a short title for your ticket.")
            .on_complete(set_summary)
            .goto("general_help_category"),
    );
    flow.insert(
        "general_help_category",
        FlowStep::say("What type of issue are you experiencing?")
            .options(&[
                "User Account Question",
                "Allocation Question",
                "User Support Question",
                "CSSN/CCEP Question",
                "Training Question",
                "Metrics Question",
                "OnDemand Question",
                "Pegasus Question",
                "XDMoD Question",
                "Some Other Question",
            ])
            .on_complete(set_category)
            .goto("general_help_description"),
    );
    flow.insert(
        "general_help_description",
        FlowStep::say("Please describe your issue.")
            .on_complete(set_description)
            .goto("general_help_attachment"),
    );
    flow.insert(
        "general_help_attachment",
        FlowStep::say("Would you like to attach a file to your ticket?")
            .options(&["Yes", "No"])
            .on_complete(set_wants_attachment)
            .branch(route_attachment),
    );
    flow.insert(
        "general_help_upload",
        FlowStep::say("Please upload your file.")
            .upload()
            .options(&["Continue"])
            .on_complete(confirm_upload)
            .goto("general_help_resource"),
    );
    flow.insert(
        "general_help_resource",
        FlowStep::say("Does your problem involve an ACCESS Resource?")
            .options(&["Yes", "No"])
            .on_complete(set_involves_resource)
            .branch(route_resource),
    );
    flow.insert(
        "general_help_resource_details",
        FlowStep::say("Please select the ACCESS Resource involved with your issue:")
            .options(RESOURCES)
            .on_complete(set_resource_name)
            .goto("general_help_user_id_at_resource"),
    );
    flow.insert(
        "general_help_user_id_at_resource",
        FlowStep::say(
            "What is your User ID at the selected resource(s)? (Optional - press Enter to skip)",
        )
        .validator(validate_optional)
        .on_complete(set_user_id_at_resource)
        .goto("general_help_keywords"),
    );
    flow.insert(
        "general_help_keywords",
        FlowStep::say("Please add up to 5 keywords to help route your ticket.")
            .checkboxes(KEYWORDS, 0, MAX_KEYWORDS)
            .on_complete(set_keywords)
            .branch(route_keywords),
    );
    flow.insert(
        "general_help_additional_keywords",
        FlowStep::say("Please enter additional keywords, separated by commas:")
            .on_complete(merge_additional_keywords)
            .goto("general_help_priority"),
    );
    flow.insert(
        "general_help_priority",
        FlowStep::say("Please select a priority for your issue:")
            .options(&["Lowest", "Low", "Medium", "High", "Highest"])
            .on_complete(set_priority)
            .branch(route_contact),
    );
    flow.insert(
        "general_help_email",
        FlowStep::say("What is your email address?")
            .validator(validate_email)
            .on_complete(set_email)
            .branch(route_contact),
    );
    flow.insert(
        "general_help_name",
        FlowStep::say("What is your name?")
            .on_complete(set_name)
            .branch(route_contact),
    );
    flow.insert(
        "general_help_accessid",
        FlowStep::say("What is your ACCESS ID? (Optional - press Enter to skip)")
            .validator(validate_optional)
            .on_complete(set_access_id)
            .goto("general_help_ticket_summary"),
    );
    flow.insert(
        "general_help_ticket_summary",
        FlowStep::computed(summary_message)
            .options(&[SUBMIT, "Back to Main Menu"])
            .on_complete_async(submit)
            .branch(route_summary),
    );
    flow.insert(
        "general_help_success",
        FlowStep::computed(success_message)
            .options(&["Back to Main Menu"])
            .html(&[Role::Bot])
            .goto(START),
    );
    flow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(input: &str) -> ChatState {
        ChatState {
            user_input: String::from(input),
            prev_path: None,
        }
    }

    #[test]
    fn keyword_sentinel_detours_to_free_text() {
        let ctx = Context::new("s");
        assert_eq!(
            route_keywords(&state("SLURM, I don't see a relevant keyword"), &ctx),
            "general_help_additional_keywords"
        );
        assert_eq!(
            route_keywords(&state("SLURM, MPI"), &ctx),
            "general_help_priority"
        );
        assert_eq!(route_keywords(&state(""), &ctx), "general_help_priority");
    }

    #[test]
    fn additional_keywords_replace_the_sentinel() {
        let mut ctx = Context::new("s");
        ctx.form.keywords = Some(String::from("SLURM, I don't see a relevant keyword"));
        merge_additional_keywords(&state("quantum annealing"), &mut ctx);
        assert_eq!(
            ctx.form.keywords.as_deref(),
            Some("SLURM, quantum annealing")
        );
        assert_eq!(
            ctx.form.suggested_keyword.as_deref(),
            Some("quantum annealing")
        );
    }

    #[test]
    fn additional_keywords_stand_alone_when_nothing_was_picked() {
        let mut ctx = Context::new("s");
        ctx.form.keywords = Some(String::from(NO_KEYWORD));
        merge_additional_keywords(&state("jupyter kernels"), &mut ctx);
        assert_eq!(ctx.form.keywords.as_deref(), Some("jupyter kernels"));
    }

    #[test]
    fn priority_is_stored_lowercased() {
        let mut ctx = Context::new("s");
        set_priority(&state("Highest"), &mut ctx);
        assert_eq!(ctx.form.priority.as_deref(), Some("highest"));
    }

    #[test]
    fn summary_includes_resource_block_only_when_involved() {
        let services = Services::new(crate::man::settings::Settings::default());
        let mut ctx = Context::new("s");
        ctx.form.involves_resource = Some(String::from("no"));
        ctx.form.resource_name = Some(String::from("Anvil"));
        let msg = summary_message(&state(""), &ctx, &services);
        assert!(!msg.contains("Resource: Anvil"));

        ctx.form.involves_resource = Some(String::from("yes"));
        ctx.form.user_id_at_resource = Some(String::from("user42"));
        let msg = summary_message(&state(""), &ctx, &services);
        assert!(msg.contains("Resource: Anvil"));
        assert!(msg.contains("User ID at Resource: user42"));
    }

    #[test]
    fn keyword_list_ends_with_the_sentinel() {
        assert_eq!(KEYWORDS.last().copied(), Some(NO_KEYWORD));
    }
}
