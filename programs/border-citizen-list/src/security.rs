use solana_security_txt::security_txt;

// Contact and policy fields are added once the deployment has published ones
security_txt! {
    name: "Border Citizen List program"
}
